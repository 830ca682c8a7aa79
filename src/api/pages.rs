//! HTML pages: public share page and the upload form

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};

use crate::AppState;
use crate::data::Podcast;

const UPLOAD_FORM: &str = include_str!("../../static/upload.html");

/// GET /share/:id
///
/// Reads the local database only. A missing podcast or a failed lookup is a
/// plain-text 404.
pub async fn share_page(State(state): State<AppState>, Path(id): Path<i64>) -> Response {
    match state.podcasts.get_local(id).await {
        Ok(Some(podcast)) => Html(render_share_page(&podcast)).into_response(),
        Ok(None) => not_found(),
        Err(error) => {
            tracing::warn!(id, %error, "Share page lookup failed");
            not_found()
        }
    }
}

fn not_found() -> Response {
    (StatusCode::NOT_FOUND, "Podcast not found").into_response()
}

/// GET /upload
pub async fn upload_form() -> Html<&'static str> {
    Html(UPLOAD_FORM)
}

pub fn render_share_page(podcast: &Podcast) -> String {
    let title = html_escape::encode_text(&podcast.title);
    let description = html_escape::encode_text(&podcast.description);
    let audio_url = podcast.playable_url();
    let audio_src = html_escape::encode_double_quoted_attribute(&audio_url);

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <meta name="viewport" content="width=device-width, initial-scale=1">
  <title>{title}</title>
  <style>
    body {{ font-family: sans-serif; max-width: 40rem; margin: 2rem auto; padding: 0 1rem; }}
    audio {{ width: 100%; margin-top: 1rem; }}
  </style>
</head>
<body>
  <h1>{title}</h1>
  <p>{description}</p>
  <audio controls src="{audio_src}"></audio>
</body>
</html>
"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn podcast(title: &str, file_url: Option<&str>) -> Podcast {
        Podcast {
            id: 7,
            title: title.to_string(),
            description: "Tom & Jerry".to_string(),
            filename: "1700000000000-42.mp3".to_string(),
            originalname: "ep.mp3".to_string(),
            duration: None,
            filesize: 1000,
            file_url: file_url.map(str::to_string),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn share_page_escapes_metadata() {
        let html = render_share_page(&podcast("<script>alert(1)</script>", None));

        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
        assert!(html.contains("Tom &amp; Jerry"));
    }

    #[test]
    fn share_page_prefers_file_url() {
        let html = render_share_page(&podcast("Ep", Some("https://cdn.example.com/a.mp3")));
        assert!(html.contains(r#"src="https://cdn.example.com/a.mp3""#));

        let html = render_share_page(&podcast("Ep", None));
        assert!(html.contains(r#"src="/uploads/1700000000000-42.mp3""#));
    }
}

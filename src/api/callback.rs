use axum::{Extension, extract::OriginalUri, http::HeaderMap, response::Html};

use crate::server::CallbackSlot;

pub async fn callback(
    OriginalUri(uri): OriginalUri,
    headers: HeaderMap,
    Extension(slot): Extension<CallbackSlot>,
) -> Html<&'static str> {
    let Some(sender) = slot.lock().await.take() else {
        return Html("<h4>Authorization callback already handled.</h4>");
    };

    // rebuild an absolute URI so the flow can parse it like a pasted one
    let host = headers
        .get(axum::http::header::HOST)
        .and_then(|h| h.to_str().ok())
        .unwrap_or("localhost");
    let callback_uri = format!("http://{}{}", host, uri);

    let denied = uri
        .query()
        .is_some_and(|q| q.split('&').any(|pair| pair.starts_with("error=")));

    if sender.send(callback_uri).is_err() {
        return Html("<h4>Login is no longer pending.</h4>");
    }

    if denied {
        Html("<h4>Login failed.</h4><p>Close browser window.</p>")
    } else {
        Html("<h2>Authorization received.</h2><p>Close browser window.</p>")
    }
}

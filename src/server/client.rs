//! Browser side of live reload.

use std::sync::Arc;

use axum::extract::State;
use axum::http::header;
use axum::response::IntoResponse;

use super::AppState;

const CLIENT_JS: &str = r#"(function () {
  "use strict";
  var NOTIFY = __NOTIFY__;
  var RETRY_MS = 1000;

  function toast(text) {
    if (!NOTIFY || !document.body) return;
    var el = document.createElement("div");
    el.textContent = text;
    el.style.cssText =
      "position:fixed;right:1em;bottom:1em;z-index:2147483647;padding:.5em 1em;" +
      "background:#222;color:#fff;font:13px sans-serif;border-radius:3px;opacity:.9";
    document.body.appendChild(el);
    setTimeout(function () { el.remove(); }, 1500);
  }

  function inject(path) {
    var found = false;
    document.querySelectorAll('link[rel="stylesheet"]').forEach(function (link) {
      var url = new URL(link.href, location.href);
      if (url.pathname !== path) return;
      url.searchParams.set("livereload", Date.now());
      link.href = url.toString();
      found = true;
    });
    if (!found) {
      location.reload();
      return;
    }
    toast("Injected " + path);
  }

  function connect() {
    var proto = location.protocol === "https:" ? "wss:" : "ws:";
    var ws = new WebSocket(proto + "//" + location.host + "__WS_PATH__");
    ws.onmessage = function (ev) {
      var msg;
      try { msg = JSON.parse(ev.data); } catch (e) { return; }
      if (msg.type === "inject") {
        inject(msg.path);
      } else if (msg.type === "reload") {
        toast("Reloading");
        location.reload();
      }
    };
    ws.onclose = function () { setTimeout(connect, RETRY_MS); };
  }

  connect();
})();
"#;

/// Serve the client script.
pub(crate) async fn client_script(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "application/javascript; charset=utf-8")],
        render(state.notify),
    )
}

fn render(notify: bool) -> String {
    CLIENT_JS
        .replace("__NOTIFY__", if notify { "true" } else { "false" })
        .replace("__WS_PATH__", super::app::WS_PATH)
}

use serde_json::Value;

use super::{Generation, PageOptions};
use crate::link::VideoId;

const PAGE_TEMPLATE: &str = r#"<!DOCTYPE html>
<html>
  <head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <title>linkplay</title>
  </head>
  <body style="margin: 0; padding: 0; background: #242424">
    <div id="player"></div>
    <script src="https://www.youtube.com/iframe_api"></script>
    <script>
      var TOKEN = "__BRIDGE_TOKEN__";
      var GENERATION = __GENERATION__;
      var player;

      function onYouTubeIframeAPIReady() {
        player = new YT.Player('player', {
          width: '__WIDTH__',
          height: '__HEIGHT__',
          videoId: __VIDEO_ID__,
          events: {
            'onReady': onPlayerReady,
            'onStateChange': onPlayerStateChange
          }
        });
      }

      function postMessageToHost(type, data) {
        fetch('/message?gen=' + GENERATION + '&token=' + TOKEN, {
          method: 'POST',
          headers: { 'Content-Type': 'application/json' },
          body: JSON.stringify({ type: type, data: data })
        }).catch(function () {});
      }

      function onPlayerReady(event) {
        postMessageToHost('duration', player.getDuration());
        postMessageToHost('playerReady', true);
        setInterval(function () {
          postMessageToHost('currentTime', player.getCurrentTime());
        }, __TIME_UPDATE_MS__);
      }

      function onPlayerStateChange(event) {
        postMessageToHost('stateChange', event.data);
      }

      function playVideo() {
        if (player && player.playVideo) { player.playVideo(); }
      }

      function pauseVideo() {
        if (player && player.pauseVideo) { player.pauseVideo(); }
      }

      var COMMANDS = { playVideo: playVideo, pauseVideo: pauseVideo };

      function pollCommands() {
        fetch('/commands?gen=' + GENERATION + '&token=' + TOKEN)
          .then(function (response) { return response.json(); })
          .then(function (batch) {
            if (batch.reload) { window.location.reload(); return; }
            batch.commands.forEach(function (name) {
              var command = COMMANDS[name];
              if (command) { command(); }
            });
          })
          .catch(function () {});
      }

      setInterval(pollCommands, __COMMAND_POLL_MS__);
    </script>
  </body>
</html>
"#;

const PLACEHOLDER_TEMPLATE: &str = r#"<!DOCTYPE html>
<html>
  <head>
    <meta charset="utf-8">
    <title>linkplay</title>
  </head>
  <body style="margin: 0; padding: 16px; background: #242424; color: #AEAEB2; font-family: sans-serif">
    <p>Waiting for a link...</p>
    <script>
      var TOKEN = "__BRIDGE_TOKEN__";
      setInterval(function () {
        fetch('/commands?gen=0&token=' + TOKEN)
          .then(function (response) { return response.json(); })
          .then(function (batch) { if (batch.reload) { window.location.reload(); } })
          .catch(function () {});
      }, __COMMAND_POLL_MS__);
    </script>
  </body>
</html>
"#;

/// Left in generated pages for the serving host to fill with its access
/// token. It precedes every other substituted value in the page.
pub const TOKEN_PLACEHOLDER: &str = "__BRIDGE_TOKEN__";

/// The self-contained document that hosts one YouTube IFrame player
pub struct EmbedPage<'a> {
    video_id: &'a VideoId,
    generation: Generation,
    options: &'a PageOptions,
}

impl<'a> EmbedPage<'a> {
    pub fn new(video_id: &'a VideoId, generation: Generation, options: &'a PageOptions) -> Self {
        Self {
            video_id,
            generation,
            options,
        }
    }

    pub fn render(&self) -> String {
        PAGE_TEMPLATE
            .replace("__GENERATION__", &self.generation.value().to_string())
            .replace("__WIDTH__", &self.options.dimensions.width.to_string())
            .replace("__HEIGHT__", &self.options.dimensions.height.to_string())
            .replace("__TIME_UPDATE_MS__", &self.options.time_update.as_millis().to_string())
            .replace("__COMMAND_POLL_MS__", &self.options.command_poll.as_millis().to_string())
            // Last, so nothing inside the identifier is taken for a placeholder
            .replace("__VIDEO_ID__", &script_string(self.video_id.as_str()))
    }
}

/// Page served while nothing is mounted. Reloads once a player is mounted.
pub fn placeholder_page(options: &PageOptions, token: &str) -> String {
    PLACEHOLDER_TEMPLATE
        .replace("__COMMAND_POLL_MS__", &options.command_poll.as_millis().to_string())
        .replace(TOKEN_PLACEHOLDER, token)
}

/// Fill the access token into a page rendered by [`EmbedPage`]
pub fn with_token(html: &str, token: &str) -> String {
    html.replacen(TOKEN_PLACEHOLDER, token, 1)
}

/// Quote `value` as a JavaScript string literal that is safe inside <script>
fn script_string(value: &str) -> String {
    Value::String(value.to_string())
        .to_string()
        .replace('<', "\\u003c")
        .replace('>', "\\u003e")
        .replace('&', "\\u0026")
}

//! Cross-platform notification support.
//! Desktop notifications are implemented for macOS; everywhere else the
//! message degrades to a log line. Nothing in here may error or block.

#[cfg(target_os = "macos")]
use std::process::Command;

/// One-shot "show message to user" capability. Implementations must never
/// fail; at worst they drop to a log line.
pub trait Notifier {
    fn notify(&self, title: &str, body: &str);
}

/// System notifier backed by the platform's notification facility.
pub struct DesktopNotifier;

impl DesktopNotifier {
    /// Whether the platform can show real notifications. When this is false
    /// every message takes the log fallback instead, never an error.
    pub fn permission_granted() -> bool {
        cfg!(target_os = "macos")
    }
}

impl Notifier for DesktopNotifier {
    fn notify(&self, title: &str, body: &str) {
        #[cfg(target_os = "macos")]
        {
            let script = format!(
                r#"display notification "{}" with title "{}""#,
                body.replace('"', "\\\""),
                title.replace('"', "\\\"")
            );

            let _ = Command::new("osascript").arg("-e").arg(&script).output();
        }

        #[cfg(not(target_os = "macos"))]
        {
            log::info!("{}: {}", title, body);
        }
    }
}

/// Notifier that records every message, for assertions on side effects.
#[cfg(test)]
pub mod recording {
    use super::Notifier;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Default, Clone)]
    pub struct RecordingNotifier {
        pub messages: Rc<RefCell<Vec<(String, String)>>>,
    }

    impl Notifier for RecordingNotifier {
        fn notify(&self, title: &str, body: &str) {
            self.messages
                .borrow_mut()
                .push((title.to_string(), body.to_string()));
        }
    }
}

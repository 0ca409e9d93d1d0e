#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Success,
    Error,
}

/// A transient message for the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub kind: NotificationKind,
    pub message: String,
}

impl Notification {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: NotificationKind::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: NotificationKind::Error,
            message: message.into(),
        }
    }
}

/// Presentation hooks the signup flow calls into.
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);

    /// One-shot celebratory effect after a successful signup.
    fn celebrate(&self);
}

/// Writes notifications to the terminal.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleNotifier {
    pub quiet: bool,
}

impl Notifier for ConsoleNotifier {
    fn notify(&self, notification: Notification) {
        if self.quiet {
            return;
        }
        match notification.kind {
            NotificationKind::Success => println!("{}", notification.message),
            NotificationKind::Error => eprintln!("error: {}", notification.message),
        }
    }

    fn celebrate(&self) {
        if self.quiet {
            return;
        }
        println!("*  .  * \\o/ *  .  *  welcome aboard!");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn console_notifier_writes_both_kinds() {
        for quiet in [false, true] {
            let notifier = ConsoleNotifier { quiet };
            notifier.notify(Notification::success("joined"));
            notifier.notify(Notification::error("already joined"));
            notifier.celebrate();
        }
    }
}

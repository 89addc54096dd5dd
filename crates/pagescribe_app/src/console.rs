use pagescribe_core::StatusMsg;

/// How a stream of status messages ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Finish {
    Done(String),
    Failed(String),
}

/// One printable line per message, plus the end of the stream when reached.
pub fn render(msg: &StatusMsg) -> (String, Option<Finish>) {
    match msg {
        StatusMsg::Progress {
            value,
            current,
            total,
            ..
        } => (format!("[{value:>3}%] {current}/{total}"), None),
        StatusMsg::Status { text, .. } => (text.clone(), None),
        StatusMsg::Complete { run_id } => {
            let line = format!("{run_id}: complete");
            (line.clone(), Some(Finish::Done(line)))
        }
        StatusMsg::PartialComplete { run_id } => {
            let line = format!("{run_id}: partial export written");
            (line.clone(), Some(Finish::Done(line)))
        }
        StatusMsg::Error { message } => {
            (format!("error: {message}"), Some(Finish::Failed(message.clone())))
        }
    }
}

#[cfg(test)]
mod tests {
    use pagescribe_core::StatusMsg;

    use super::{render, Finish};

    #[test]
    fn progress_is_not_terminal() {
        let (line, finish) = render(&StatusMsg::progress("r", 1, 4));
        assert_eq!(line, "[ 25%] 2/4");
        assert_eq!(finish, None);
    }

    #[test]
    fn complete_and_error_end_the_stream() {
        let (_, finish) = render(&StatusMsg::Complete {
            run_id: "r".to_string(),
        });
        assert!(matches!(finish, Some(Finish::Done(_))));

        let (line, finish) = render(&StatusMsg::Error {
            message: "boom".to_string(),
        });
        assert_eq!(line, "error: boom");
        assert_eq!(finish, Some(Finish::Failed("boom".to_string())));
    }
}

use crate::model::Paper;

pub struct Formatter;

impl Formatter {
    /// Slack mrkdwn: bold title, abstract, then the link.
    pub fn to_slack_message(data: &Paper) -> String {
        format!("*{}*\n{}\n<{}|{}>",
            escape_slack(&data.title),
            escape_slack(&data.summary),
            data.url,
            data.url
        )
    }

    pub fn to_log_line(data: &Paper) -> String {
        match data.authors.as_slice() {
            [] => format!("{} ({})", data.title, data.url),
            [first] => format!("{} - {} ({})", data.title, first, data.url),
            [first, ..] => format!("{} - {} et al. ({})", data.title, first, data.url),
        }
    }
}

// slack treats these three as control characters in message text.
fn escape_slack(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slack_message() {
        let paper = Paper::new(
            "Bounds for <k> & friends",
            "We prove a > b.",
            "http://arxiv.org/abs/2410.00001v1"
        );
        assert_eq!(
            Formatter::to_slack_message(&paper),
            "*Bounds for &lt;k&gt; &amp; friends*\nWe prove a &gt; b.\n\
             <http://arxiv.org/abs/2410.00001v1|http://arxiv.org/abs/2410.00001v1>"
        );
    }

    #[test]
    fn test_log_line() {
        let paper = Paper::new("Robot Hands", "Grasping.", "http://arxiv.org/abs/1");
        assert_eq!(Formatter::to_log_line(&paper), "Robot Hands (http://arxiv.org/abs/1)");

        let paper = paper.with_authors(vec!["Grace Hopper".to_string(), "Alan Turing".to_string()]);
        assert_eq!(Formatter::to_log_line(&paper), "Robot Hands - Grace Hopper et al. (http://arxiv.org/abs/1)");
    }
}

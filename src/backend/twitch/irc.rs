use std::collections::HashMap;

/// A single IRC line as sent by Twitch chat, IRCv3 tags included
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IrcMessage {
    pub tags: HashMap<String, String>,
    pub prefix: Option<String>,
    pub command: String,
    pub params: Vec<String>,
}

impl IrcMessage {
    /// Parse one line (without the trailing CRLF). Returns `None` for blank
    /// or truncated lines.
    pub fn parse(line: &str) -> Option<Self> {
        let mut rest = line.trim_end_matches(['\r', '\n']);
        let mut message = IrcMessage::default();

        if let Some(tagged) = rest.strip_prefix('@') {
            let (tags, remainder) = tagged.split_once(' ')?;
            message.tags = tags
                .split(';')
                .filter(|tag| !tag.is_empty())
                .map(|tag| match tag.split_once('=') {
                    Some((key, value)) => (key.to_string(), unescape_tag(value)),
                    None => (tag.to_string(), String::new()),
                })
                .collect();
            rest = remainder;
        }

        rest = rest.trim_start();
        if let Some(prefixed) = rest.strip_prefix(':') {
            let (prefix, remainder) = prefixed.split_once(' ')?;
            message.prefix = Some(prefix.to_string());
            rest = remainder.trim_start();
        }

        let (command, mut params) = match rest.split_once(' ') {
            Some((command, params)) => (command, params),
            None => (rest, ""),
        };
        if command.is_empty() {
            return None;
        }
        message.command = command.to_string();

        while !params.is_empty() {
            if let Some(trailing) = params.strip_prefix(':') {
                message.params.push(trailing.to_string());
                break;
            }
            match params.split_once(' ') {
                Some((param, remainder)) => {
                    if !param.is_empty() {
                        message.params.push(param.to_string());
                    }
                    params = remainder;
                }
                None => {
                    message.params.push(params.to_string());
                    break;
                }
            }
        }

        Some(message)
    }

    /// Nickname part of the prefix (`nick!user@host`)
    pub fn nick(&self) -> Option<&str> {
        let prefix = self.prefix.as_deref()?;
        Some(prefix.split('!').next().unwrap_or(prefix))
    }

    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags.get(key).map(String::as_str).filter(|v| !v.is_empty())
    }

    /// Last parameter, which carries the message text for PRIVMSG and NOTICE
    pub fn trailing(&self) -> Option<&str> {
        self.params.last().map(String::as_str)
    }

    /// Badge set names from the `badges` tag, e.g. `["broadcaster", "subscriber"]`
    pub fn badges(&self) -> Vec<&str> {
        self.tag("badges")
            .map(|badges| {
                badges
                    .split(',')
                    .filter_map(|badge| badge.split('/').next())
                    .filter(|name| !name.is_empty())
                    .collect()
            })
            .unwrap_or_default()
    }
}

fn unescape_tag(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some(':') => out.push(';'),
            Some('s') => out.push(' '),
            Some('\\') => out.push('\\'),
            Some('r') => out.push('\r'),
            Some('n') => out.push('\n'),
            Some(other) => out.push(other),
            None => {}
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tagged_privmsg() {
        let line = "@badge-info=;badges=broadcaster/1,subscriber/0;color=#0D4200;display-name=Ronni;mod=0 :ronni!ronni@ronni.tmi.twitch.tv PRIVMSG #ronni :!winner now please";
        let message = IrcMessage::parse(line).unwrap();

        assert_eq!(message.command, "PRIVMSG");
        assert_eq!(message.nick(), Some("ronni"));
        assert_eq!(message.params, vec!["#ronni", "!winner now please"]);
        assert_eq!(message.tag("display-name"), Some("Ronni"));
        assert_eq!(message.tag("badge-info"), None);
        assert_eq!(message.badges(), vec!["broadcaster", "subscriber"]);
    }

    #[test]
    fn test_parse_ping() {
        let message = IrcMessage::parse("PING :tmi.twitch.tv\r\n").unwrap();
        assert_eq!(message.command, "PING");
        assert_eq!(message.prefix, None);
        assert_eq!(message.trailing(), Some("tmi.twitch.tv"));
    }

    #[test]
    fn test_parse_numeric_reply() {
        let message =
            IrcMessage::parse(":tmi.twitch.tv 001 bot :Welcome, GLHF!").unwrap();
        assert_eq!(message.command, "001");
        assert_eq!(message.params, vec!["bot", "Welcome, GLHF!"]);
        assert_eq!(message.nick(), Some("tmi.twitch.tv"));
    }

    #[test]
    fn test_tag_values_are_unescaped() {
        let message =
            IrcMessage::parse("@system-msg=5\\sraiders\\:\\shi :tmi.twitch.tv USERNOTICE #chan")
                .unwrap();
        assert_eq!(message.tag("system-msg"), Some("5 raiders; hi"));
    }

    #[test]
    fn test_blank_line_is_rejected() {
        assert!(IrcMessage::parse("").is_none());
        assert!(IrcMessage::parse("@badges=vip/1").is_none());
    }
}

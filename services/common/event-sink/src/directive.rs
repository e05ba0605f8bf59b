//! Directive block parser.
//!
//! A block is a sequence of lines, each holding one directive name followed by
//! its arguments:
//!
//! ```text
//! kafka {
//!     bootstrap_servers "broker-1:9092, broker-2:9092"
//!     topic "caddy.events"
//!     tls on
//!     sasl_scram sha512 "user" "secret"
//! }
//! ```
//!
//! The `name {` header and closing `}` are optional. Tokens are separated by
//! whitespace; double quotes group a token and understand `\"` and `\\`; a `#`
//! at the start of a token comments out the rest of the line. When a directive
//! repeats, the last occurrence wins.

use crate::config::{SaslAlgorithm, SinkConfig};
use crate::error::ParseError;

/// Every directive the block understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DirectiveKind {
    Topic,
    SaslScram,
    Tls,
    TlsNoVerify,
    BootstrapServers,
}

impl DirectiveKind {
    pub const ALL: [DirectiveKind; 5] = [
        DirectiveKind::Topic,
        DirectiveKind::SaslScram,
        DirectiveKind::Tls,
        DirectiveKind::TlsNoVerify,
        DirectiveKind::BootstrapServers,
    ];

    pub fn name(self) -> &'static str {
        match self {
            DirectiveKind::Topic => "topic",
            DirectiveKind::SaslScram => "sasl_scram",
            DirectiveKind::Tls => "tls",
            DirectiveKind::TlsNoVerify => "tls_no_verify",
            DirectiveKind::BootstrapServers => "bootstrap_servers",
        }
    }

    /// Exact number of arguments the directive takes.
    pub fn arity(self) -> usize {
        match self {
            DirectiveKind::Topic => 1,
            DirectiveKind::SaslScram => 3,
            DirectiveKind::Tls => 1,
            DirectiveKind::TlsNoVerify => 0,
            DirectiveKind::BootstrapServers => 1,
        }
    }

    pub fn lookup(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }

    fn apply(self, line: usize, args: &[&str], config: &mut SinkConfig) -> Result<(), ParseError> {
        match self {
            DirectiveKind::Topic => {
                config.topic = args[0].to_string();
            }
            DirectiveKind::SaslScram => {
                let algorithm = match args[0] {
                    "sha256" => SaslAlgorithm::Sha256,
                    "sha512" => SaslAlgorithm::Sha512,
                    other => {
                        return Err(ParseError::UnsupportedScramMethod {
                            line,
                            value: other.to_string(),
                        })
                    }
                };
                config.sasl_algorithm = algorithm.as_str().to_string();
                config.sasl_username = args[1].to_string();
                config.sasl_password = args[2].to_string();
                config.sasl_auth = true;
            }
            DirectiveKind::Tls => {
                config.tls_enabled = match args[0] {
                    "on" => true,
                    "off" => false,
                    other => {
                        return Err(ParseError::InvalidTls {
                            line,
                            value: other.to_string(),
                        })
                    }
                };
            }
            DirectiveKind::TlsNoVerify => {
                config.tls_no_verify = true;
            }
            DirectiveKind::BootstrapServers => {
                config.bootstrap_servers = args[0]
                    .split(',')
                    .map(|item| item.trim().to_string())
                    .collect();
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Token {
    text: String,
    quoted: bool,
}

impl Token {
    fn is(&self, symbol: &str) -> bool {
        !self.quoted && self.text == symbol
    }

    fn is_brace(&self) -> bool {
        self.is("{") || self.is("}")
    }
}

/// Parse a directive block into a fresh [`SinkConfig`]. Fields no directive
/// touches keep their defaults.
pub fn parse_block(text: &str) -> Result<SinkConfig, ParseError> {
    let mut config = SinkConfig::default();
    let mut open_block: Option<usize> = None;
    let mut closed = false;

    for (index, (line, tokens)) in tokenize(text)?.into_iter().enumerate() {
        if closed {
            return Err(ParseError::UnexpectedToken {
                line,
                token: tokens[0].text.clone(),
            });
        }
        if index == 0 && tokens.last().is_some_and(|t| t.is("{")) {
            let header = &tokens[..tokens.len() - 1];
            if let Some(brace) = header.iter().find(|t| t.is_brace()) {
                return Err(ParseError::UnexpectedToken {
                    line,
                    token: brace.text.clone(),
                });
            }
            open_block = Some(line);
            continue;
        }
        if tokens.len() == 1 && tokens[0].is("}") {
            if open_block.is_none() {
                return Err(ParseError::UnexpectedToken {
                    line,
                    token: "}".to_string(),
                });
            }
            closed = true;
            continue;
        }
        if let Some(brace) = tokens.iter().find(|t| t.is_brace()) {
            return Err(ParseError::UnexpectedToken {
                line,
                token: brace.text.clone(),
            });
        }
        apply_line(line, &tokens, &mut config)?;
    }

    match open_block {
        Some(line) if !closed => Err(ParseError::UnclosedBlock { line }),
        _ => Ok(config),
    }
}

fn apply_line(line: usize, tokens: &[Token], config: &mut SinkConfig) -> Result<(), ParseError> {
    let name = tokens[0].text.as_str();
    let Some(kind) = DirectiveKind::lookup(name) else {
        return Err(ParseError::UnknownDirective {
            line,
            name: name.to_string(),
        });
    };
    let args: Vec<&str> = tokens[1..].iter().map(|t| t.text.as_str()).collect();
    let arity = kind.arity();
    if args.len() < arity {
        return Err(ParseError::MissingArgument {
            line,
            directive: kind.name(),
        });
    }
    if args.len() > arity {
        return Err(ParseError::UnexpectedArgument {
            line,
            directive: kind.name(),
            token: args[arity].to_string(),
        });
    }
    kind.apply(line, &args, config)
}

/// Split text into non-empty lines of tokens, keeping 1-based line numbers.
fn tokenize(text: &str) -> Result<Vec<(usize, Vec<Token>)>, ParseError> {
    let mut lines = Vec::new();
    for (index, raw) in text.lines().enumerate() {
        let tokens = tokenize_line(raw, index + 1)?;
        if !tokens.is_empty() {
            lines.push((index + 1, tokens));
        }
    }
    Ok(lines)
}

fn tokenize_line(raw: &str, line: usize) -> Result<Vec<Token>, ParseError> {
    let mut tokens = Vec::new();
    let mut chars = raw.chars().peekable();
    loop {
        while chars.next_if(|c| c.is_whitespace()).is_some() {}
        let Some(&first) = chars.peek() else { break };
        if first == '#' {
            break;
        }
        let mut text = String::new();
        if first == '"' {
            chars.next();
            let mut terminated = false;
            while let Some(c) = chars.next() {
                match c {
                    '"' => {
                        terminated = true;
                        break;
                    }
                    '\\' => match chars.next_if(|n| *n == '"' || *n == '\\') {
                        Some(escaped) => text.push(escaped),
                        None => text.push('\\'),
                    },
                    other => text.push(other),
                }
            }
            if !terminated {
                return Err(ParseError::UnterminatedQuote { line });
            }
            tokens.push(Token { text, quoted: true });
        } else {
            while let Some(c) = chars.next_if(|c| !c.is_whitespace()) {
                text.push(c);
            }
            tokens.push(Token { text, quoted: false });
        }
    }
    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(raw: &str) -> Vec<String> {
        tokenize_line(raw, 1)
            .expect("tokenize")
            .into_iter()
            .map(|t| t.text)
            .collect()
    }

    #[test]
    fn quotes_group_and_unescape() {
        assert_eq!(
            texts(r#"sasl_scram sha256 "my user" "pa\"ss\\word""#),
            vec!["sasl_scram", "sha256", "my user", "pa\"ss\\word"]
        );
    }

    #[test]
    fn comments_end_the_line() {
        assert_eq!(texts("tls on # enable transport security"), vec!["tls", "on"]);
        assert!(texts("   # only a comment").is_empty());
    }

    #[test]
    fn unterminated_quote_is_reported() {
        assert!(matches!(
            tokenize_line(r#"topic "events"#, 7),
            Err(ParseError::UnterminatedQuote { line: 7 })
        ));
    }

    #[test]
    fn every_kind_round_trips_through_lookup() {
        for kind in DirectiveKind::ALL {
            assert_eq!(DirectiveKind::lookup(kind.name()), Some(kind));
        }
        assert_eq!(DirectiveKind::lookup("foo"), None);
    }
}

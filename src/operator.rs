//! Operator console commands. Parsing only; the engine executes each
//! command against the shared state.

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// `<dest> <message>` — enqueue an outbound entry.
    Enqueue { dest: String, message: String },
    ForceToken,
    RemoveToken,
    ClearQueue,
    DuplicateToken,
    RingStatus,
    Debug,
    ShowQueue,
    SetHoldTime(f64),
    Help,
    Shutdown,
    /// Recognized syntax but nothing we understand, e.g. `/tempo` with a
    /// non-numeric argument, or a bare `/` command we don't implement.
    Invalid(String),
}

pub fn parse(line: &str) -> Option<Command> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    if let Some(rest) = line.strip_prefix('/') {
        return Some(parse_slash_command(rest));
    }

    let mut parts = line.splitn(2, char::is_whitespace);
    let dest = parts.next()?.to_string();
    let message = parts.next().unwrap_or("").trim().to_string();
    if message.is_empty() {
        return Some(Command::Invalid(line.to_string()));
    }
    Some(Command::Enqueue { dest, message })
}

fn parse_slash_command(rest: &str) -> Command {
    let mut parts = rest.splitn(2, char::is_whitespace);
    let name = parts.next().unwrap_or("");
    let arg = parts.next().unwrap_or("").trim();

    match name {
        "forcartoken" => Command::ForceToken,
        "removertoken" => Command::RemoveToken,
        "limparfila" => Command::ClearQueue,
        "duplicartoken" => Command::DuplicateToken,
        "statusanel" => Command::RingStatus,
        "debug" => Command::Debug,
        "mostrafila" => Command::ShowQueue,
        "ajuda" => Command::Help,
        "sair" => Command::Shutdown,
        "tempo" => match arg.parse::<f64>() {
            Ok(value) if value > 0.0 => Command::SetHoldTime(value),
            _ => Command::Invalid(format!("/tempo {}", arg)),
        },
        other => Command::Invalid(format!("/{}", other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_an_enqueue_command() {
        assert_eq!(
            parse("B hello world"),
            Some(Command::Enqueue { dest: "B".to_string(), message: "hello world".to_string() })
        );
    }

    #[test]
    fn parses_slash_commands() {
        assert_eq!(parse("/forcartoken"), Some(Command::ForceToken));
        assert_eq!(parse("/removertoken"), Some(Command::RemoveToken));
        assert_eq!(parse("/limparfila"), Some(Command::ClearQueue));
        assert_eq!(parse("/duplicartoken"), Some(Command::DuplicateToken));
        assert_eq!(parse("/statusanel"), Some(Command::RingStatus));
        assert_eq!(parse("/debug"), Some(Command::Debug));
        assert_eq!(parse("/mostrafila"), Some(Command::ShowQueue));
        assert_eq!(parse("/sair"), Some(Command::Shutdown));
    }

    #[test]
    fn parses_tempo_with_float_argument() {
        assert_eq!(parse("/tempo 2.5"), Some(Command::SetHoldTime(2.5)));
    }

    #[test]
    fn rejects_non_numeric_tempo() {
        assert!(matches!(parse("/tempo banana"), Some(Command::Invalid(_))));
    }

    #[test]
    fn blank_line_parses_to_none() {
        assert_eq!(parse("   "), None);
    }

    #[test]
    fn enqueue_without_message_is_invalid() {
        assert!(matches!(parse("B"), Some(Command::Invalid(_))));
    }

    #[test]
    fn unknown_slash_command_is_invalid() {
        assert!(matches!(parse("/nonsense"), Some(Command::Invalid(_))));
    }
}

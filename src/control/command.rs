//! Chat command parsing

/// A recognized chat command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    Pause,
    Resume,
    Status,
    /// `/interval <secs>`; `None` when the argument is missing or not a number
    Interval(Option<u64>),
    Thresholds,
    /// `/set <param> <value>`; `None` when the argument count is wrong
    Set(Option<(String, String)>),
    Stats,
}

impl Command {
    /// Parse message text into a command
    ///
    /// Returns `None` for text that is not a known command. A `@botname`
    /// suffix on the command word is ignored.
    pub fn parse(text: &str) -> Option<Self> {
        let mut parts = text.split_whitespace();
        let word = parts.next()?;
        let name = word.strip_prefix('/')?;
        let name = name.split_once('@').map_or(name, |(name, _)| name);
        let args: Vec<&str> = parts.collect();

        let command = match name {
            "help" | "start" => Command::Help,
            "pause" => Command::Pause,
            "resume" => Command::Resume,
            "status" => Command::Status,
            "interval" => Command::Interval(match args.as_slice() {
                [secs] => secs.parse().ok(),
                _ => None,
            }),
            "thresholds" => Command::Thresholds,
            "set" => Command::Set(match args.as_slice() {
                [param, value] => Some((param.to_string(), value.to_string())),
                _ => None,
            }),
            "stats" => Command::Stats,
            _ => return None,
        };
        Some(command)
    }
}

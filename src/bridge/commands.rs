//! The command table: which prefixed messages are handled locally, which
//! are forwarded to the bus, and which need a per-channel toggle first.
//!
//! Matching is case-sensitive on the text after the command prefix.

/// Commands forwarded as-is.
const SIMPLE: &[&str] = &[
    "ping", "пинг", "пинх", "pong", "понг", "понх", "coin", "монетка", "roll", "dice", "кости",
    "ver", "version", "версия", "хэлп", "halp", "kde", "кде", "lat", "лат", "friday", "пятница",
    "proverb", "пословица", "пословиться", "fortune", "фортунка", "f", "ф", "anek", "анек",
    "анекдот", "buni", "cat", "кис", "drink", "праздник", "fox", "лис", "frog", "лягушка", "horse",
    "лошадь", "лошадка", "monkeyuser", "owl", "сова", "сыч", "rabbit", "bunny", "кролик", "snail",
    "улитка", "xkcd", "dig", "копать", "fish", "fishing", "рыба", "рыбка", "рыбалка", "karma",
    "карма",
];

/// Drinks the barman pours, optionally for someone else.
const BARMAN: &[&str] = &[
    "rum", "ром", "vodka", "водка", "beer", "пиво", "tequila", "текила", "whisky", "виски",
    "absinthe", "абсент",
];

/// Prefixes of commands that take a free-form argument.
const PARAMETRIZED: &[&str] = &["w ", "п ", "погода ", "погодка ", "погадка ", "weather "];

const HELP: &[&str] = &["help", "помощь"];

/// Per-channel feature toggles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Toggle {
    Boobs,
    Butts,
}

impl Toggle {
    pub const ALL: [Toggle; 2] = [Toggle::Boobs, Toggle::Butts];

    /// Settings key.
    pub fn key(self) -> &'static str {
        match self {
            Toggle::Boobs => "oboobs",
            Toggle::Butts => "obutts",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Toggle::ALL.into_iter().find(|t| t.key() == key)
    }

    /// Commands gated by this toggle.
    pub fn commands(self) -> &'static [&'static str] {
        match self {
            Toggle::Boobs => &["tits", "boobs", "tities", "boobies", "сиси", "сисечки"],
            Toggle::Butts => &["butt", "booty", "ass", "попа", "попка"],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdminCommand {
    /// Bare `admin`: list the toggles.
    List,
    Show(Toggle),
    Set(Toggle, bool),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    Admin(AdminCommand),
    /// Forward unchanged.
    Forward,
    /// A drink, optionally ordered for another nick.
    Barman { target: Option<String> },
    /// Forward only when the toggle is on for the channel.
    Gated(Toggle),
    /// Not ours; ignored.
    Unknown,
}

fn first_word(cmd: &str) -> &str {
    cmd.split(' ').next().unwrap_or(cmd)
}

fn classify_admin(rest: &str) -> Option<AdminCommand> {
    let mut words = rest.split(' ');
    let toggle = Toggle::from_key(words.next()?)?;
    match (words.next(), words.next()) {
        (None, _) => Some(AdminCommand::Show(toggle)),
        (Some("1"), None) => Some(AdminCommand::Set(toggle, true)),
        (Some("0"), None) => Some(AdminCommand::Set(toggle, false)),
        _ => None,
    }
}

/// Classify the text following the command prefix.
pub fn classify(cmd: &str) -> Command {
    if HELP.contains(&cmd) {
        return Command::Help;
    }
    if cmd == "admin" {
        return Command::Admin(AdminCommand::List);
    }
    if let Some(rest) = cmd.strip_prefix("admin ") {
        return classify_admin(rest).map_or(Command::Unknown, Command::Admin);
    }
    if SIMPLE.contains(&cmd) {
        return Command::Forward;
    }
    if BARMAN.contains(&cmd) {
        return Command::Barman { target: None };
    }
    if let Some((drink, rest)) = cmd.split_once(' ') {
        if BARMAN.contains(&drink) {
            let target = rest.trim();
            return Command::Barman {
                target: (!target.is_empty()).then(|| target.to_owned()),
            };
        }
    }
    if PARAMETRIZED
        .iter()
        .any(|p| cmd.len() > p.len() && cmd.starts_with(p))
    {
        return Command::Forward;
    }
    let word = first_word(cmd);
    for toggle in Toggle::ALL {
        if toggle.commands().contains(&word) {
            return Command::Gated(toggle);
        }
    }
    Command::Unknown
}

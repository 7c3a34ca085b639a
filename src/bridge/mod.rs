//! Relaying between IRC chat and the message bus.
//!
//! Channel chat becomes [`BusEnvelope`]s; envelopes from the bus become
//! [`OutboundEnvelope`]s on the rate-governed lanes. A handful of commands
//! (`help`, `admin ...`) are answered locally and never reach the bus.

mod commands;
mod envelope;

pub use commands::{AdminCommand, Command, Toggle, classify};
pub use envelope::{BusEnvelope, EnvelopeError, Misc};

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::bus::BusPublisher;
use crate::config::Config;
use crate::irc::Event;
use crate::outbound::{Outbound, OutboundEnvelope};
use crate::settings::SettingsStore;
use crate::shutdown::Shutdown;
use crate::state::{ConnectionState, PrivilegeCache};

/// Envelope mode for channel traffic.
const PUBLIC: &str = "public";

/// Help lines; `{p}` is replaced by the command prefix.
const HELP_LINES: &[&str] = &[
    "{p}help | {p}помощь              - this message",
    "{p}anek | {p}анек | {p}анекдот   - random joke",
    "{p}buni                      - hapi buni comic strip",
    "{p}bunny | {p}rabbit | {p}кролик - a rabbit",
    "{p}cat | {p}кис                 - a cat",
    "{p}coin | {p}монетка            - toss a coin",
    "{p}dice | {p}roll | {p}кости      - roll the dice",
    "{p}dig | {p}копать              - do some archaeology",
    "{p}drink | {p}праздник          - what are we celebrating today?",
    "{p}fish | {p}fishing | {p}рыбалка - go fishing",
    "{p}f | {p}fortune | {p}фортунка   - random fortune cookie",
    "{p}fox | {p}лис                 - a fox",
    "{p}friday | {p}пятница          - is it friday yet?",
    "{p}frog | {p}лягушка            - a frog",
    "{p}horse | {p}лошадь | {p}лошадка - a horse",
    "{p}karma phrase | {p}карма phrase - show the karma of a phrase",
    "phrase++ | phrase--           - raise or lower the karma of a phrase",
    "{p}lat | {p}лат                 - a latin saying",
    "{p}monkeyuser                - MonkeyUser comic strip",
    "{p}owl | {p}сова                - an owl",
    "{p}ping | {p}пинг               - ping the bot",
    "{p}proverb | {p}пословица       - random proverb",
    "{p}snail | {p}улитка            - a snail",
    "{p}<drink> [nick]            - the barman pours rum, vodka, beer, tequila, whisky or absinthe",
    "{p}ver | {p}version | {p}версия  - version information",
    "{p}w city | {p}погода city      - weather in a city",
    "{p}xkcd                      - xkcd comic strip",
];

const HELP_ADMIN_LINE: &str = "{p}admin                     - per-channel plugin settings";

/// Relays chat between IRC and the bus.
pub struct Bridge {
    config: Arc<Config>,
    privileges: Arc<PrivilegeCache>,
    session: Arc<ConnectionState>,
    outbound: Outbound,
    publisher: Arc<dyn BusPublisher>,
    settings: Arc<dyn SettingsStore>,
    shutdown: Shutdown,
}

impl Bridge {
    pub fn new(
        config: Arc<Config>,
        privileges: Arc<PrivilegeCache>,
        session: Arc<ConnectionState>,
        outbound: Outbound,
        publisher: Arc<dyn BusPublisher>,
        settings: Arc<dyn SettingsStore>,
        shutdown: Shutdown,
    ) -> Self {
        Self {
            config,
            privileges,
            session,
            outbound,
            publisher,
            settings,
            shutdown,
        }
    }

    fn prefix(&self) -> &str {
        &self.config.command_prefix
    }

    fn reply(&self, destination: &str, text: impl Into<String>) {
        self.outbound
            .enqueue(OutboundEnvelope::new(destination, text));
    }

    fn with_prefix(&self, template: &str) -> String {
        template.replace("{p}", self.prefix())
    }

    /// Envelope skeleton for something said by `nick` on `channel`.
    fn envelope(&self, channel: &str, nick: &str, user: &str, text: &str) -> BusEnvelope {
        let my_channel = &self.config.bus.my_channel;
        BusEnvelope {
            from: my_channel.clone(),
            chatid: channel.to_owned(),
            userid: user.to_owned(),
            message: text.to_owned(),
            plugin: my_channel.clone(),
            mode: PUBLIC.to_owned(),
            misc: Misc {
                answer: 0,
                bot_nick: self.config.irc.nick.clone(),
                csign: self.config.command_prefix.clone(),
                fwd_cnt: 0,
                good_morning: 0,
                msg_format: 0,
                username: nick.to_owned(),
            },
        }
    }

    /// Handle a PRIVMSG event.
    pub async fn on_privmsg(&self, event: &Event) {
        let Some(target) = event.arg(0) else {
            return;
        };
        self.on_chat(target, event.nick(), event.user(), event.trailing())
            .await;
    }

    /// Handle `text` said by `nick` (server-side username `user`) to `target`.
    pub async fn on_chat(&self, target: &str, nick: &str, user: &str, text: &str) {
        if self.shutdown.is_requested() {
            return;
        }
        // Flood protection: the bot does not talk in private.
        if self.session.is_me(target) {
            debug!(%nick, "ignoring private message");
            return;
        }

        let prefix = self.prefix();
        match text.strip_prefix(prefix) {
            Some(cmd) if !cmd.is_empty() => self.on_command(target, nick, user, text, cmd).await,
            _ => self.on_talk(target, nick, user, text),
        }
    }

    fn on_talk(&self, channel: &str, nick: &str, user: &str, text: &str) {
        let mut envelope = self.envelope(channel, nick, user, text);
        if wants_answer(text, &self.session.nick()) {
            envelope.misc.answer = 1;
        }
        self.publisher.publish(envelope);
    }

    async fn on_command(&self, channel: &str, nick: &str, user: &str, text: &str, cmd: &str) {
        let mut envelope = self.envelope(channel, nick, user, text);
        envelope.misc.answer = 1;

        match classify(cmd) {
            Command::Help => self.send_help(channel, nick),
            Command::Admin(admin) => self.on_admin(channel, nick, admin).await,
            Command::Forward => self.publisher.publish(envelope),
            Command::Barman { target: None } => self.publisher.publish(envelope),
            Command::Barman {
                target: Some(target),
            } => {
                if self.privileges.is_here(channel, &target) {
                    envelope.misc.username = target;
                    self.publisher.publish(envelope);
                } else {
                    self.reply(channel, format!("I don't see {target} here"));
                }
            }
            Command::Gated(toggle) => {
                if self.settings.get(channel, toggle.key()).await == "1" {
                    self.publisher.publish(envelope);
                } else {
                    debug!(%channel, toggle = toggle.key(), "toggle off, ignoring command");
                }
            }
            Command::Unknown => debug!(%channel, %cmd, "unknown command"),
        }
    }

    fn send_help(&self, channel: &str, nick: &str) {
        for line in HELP_LINES {
            self.reply(nick, self.with_prefix(line));
        }
        if self.privileges.is_oped(channel, nick) {
            self.reply(nick, self.with_prefix(HELP_ADMIN_LINE));
        }
    }

    async fn on_admin(&self, channel: &str, nick: &str, admin: AdminCommand) {
        if !self.privileges.is_oped(channel, nick) {
            debug!(%channel, %nick, "admin command from non-operator");
            return;
        }
        match admin {
            AdminCommand::List => {
                for toggle in Toggle::ALL {
                    let key = toggle.key();
                    let commands: Vec<String> = toggle
                        .commands()
                        .iter()
                        .map(|c| format!("{}{c}", self.prefix()))
                        .collect();
                    self.reply(
                        nick,
                        format!("{}admin {key} #    - 1 enables, 0 disables {key}", self.prefix()),
                    );
                    self.reply(
                        nick,
                        format!(
                            "{}admin {key}      - show whether {key} is enabled (commands {})",
                            self.prefix(),
                            commands.join(", ")
                        ),
                    );
                }
            }
            AdminCommand::Show(toggle) => {
                let key = toggle.key();
                let value = self.settings.get(channel, key).await;
                if value.is_empty() {
                    if let Err(e) = self.settings.set(channel, key, "0").await {
                        warn!(%channel, %key, error = %e, "Unable to store default setting");
                    }
                }
                let state = if value == "1" { "enabled" } else { "disabled" };
                self.reply(nick, format!("Plugin {key} is {state}"));
            }
            AdminCommand::Set(toggle, true) => {
                let key = toggle.key();
                match self.settings.set(channel, key, "1").await {
                    Ok(()) => {
                        info!(%channel, %key, by = %nick, "plugin enabled");
                        self.reply(nick, format!("Plugin {key} is enabled"));
                    }
                    Err(e) => {
                        warn!(%channel, %key, error = %e, "Unable to store setting");
                        self.reply(nick, format!("Plugin {key} is still disabled"));
                    }
                }
            }
            AdminCommand::Set(toggle, false) => {
                let key = toggle.key();
                if let Err(e) = self.settings.set(channel, key, "0").await {
                    warn!(%channel, %key, error = %e, "Unable to store setting");
                }
                info!(%channel, %key, by = %nick, "plugin disabled");
                self.reply(nick, format!("Plugin {key} is disabled"));
            }
        }
    }

    /// Handle one raw line from the bus.
    pub fn on_bus_line(&self, line: &str) {
        if self.shutdown.is_requested() {
            return;
        }
        debug!(%line, "bus line");

        let mut envelope = match BusEnvelope::parse(line) {
            Ok(envelope) => envelope,
            Err(e) => {
                warn!(error = %e, %line, "Incorrect message from bus");
                return;
            }
        };

        if envelope.misc.answer == 0 {
            debug!("answer = 0, skipping message");
            return;
        }
        if envelope.misc.csign.is_empty() {
            envelope.misc.csign = self.config.command_prefix.clone();
        }
        if envelope.misc.fwd_cnt == 0 {
            envelope.misc.fwd_cnt = 1;
        }
        if envelope.misc.fwd_cnt > i64::from(self.config.forwards_max) {
            warn!(
                fwd_cnt = envelope.misc.fwd_cnt,
                max = self.config.forwards_max,
                "Forward limit exceeded, dropping message"
            );
            return;
        }

        for line in envelope.message.lines() {
            self.outbound
                .enqueue(OutboundEnvelope::new(envelope.chatid.as_str(), line));
        }
    }
}

/// Whether plain chat should be flagged for an answer: it mentions the bot,
/// or it is a one-line karma change (`phrase++` / `phrase--`).
fn wants_answer(text: &str, nick: &str) -> bool {
    if !nick.is_empty() && text.contains(nick) {
        return true;
    }
    text.len() > 2 && (text.ends_with("++") || text.ends_with("--")) && !text.contains('\n')
}

//! Per-event handlers.

use slirc_wire::{Message, chunk_payload, encode_plain, irc_eq};
use tracing::{debug, error, info, warn};

use super::membership::{member_changes, split_channel_status, split_status_prefix};
use super::{Flow, Lifecycle};
use crate::irc::{Event, EventKind, IrcActions};
use crate::outbound::OutboundEnvelope;
use crate::state::Status;

/// Bot marker user mode.
const BOT_MODE: char = 'B';
const NICKSERV: &str = "NickServ";

// Numerics worth a warning: we asked for something that was not there.
const WARN_NUMERICS: &[(u16, &str)] = &[
    (401, "ERR_NOSUCHNICK"),
    (403, "ERR_NOSUCHCHANNEL"),
    (404, "ERR_CANNOTSENDTOCHAN"),
    (441, "ERR_USERNOTINCHANNEL"),
    (442, "ERR_NOTONCHANNEL"),
    (462, "ERR_ALREADYREGISTRED"),
];

// Numerics we cannot do anything about.
const ERROR_NUMERICS: &[(u16, &str)] = &[
    (405, "ERR_TOOMANYCHANNELS"),
    (407, "ERR_TOOMANYTARGETS"),
    (411, "ERR_NORECIPIENT"),
    (412, "ERR_NOTEXTTOSEND"),
    (421, "ERR_UNKNOWNCOMMAND"),
    (431, "ERR_NONICKNAMEGIVEN"),
    (432, "ERR_ERRONEUSNICKNAME"),
    (436, "ERR_NICKCOLLISION"),
    (437, "ERR_UNAVAILRESOURCE"),
    (451, "ERR_NOTREGISTERED"),
    (461, "ERR_NEEDMOREPARAMS"),
    (464, "ERR_PASSWDMISMATCH"),
    (465, "ERR_YOUREBANNEDCREEP"),
    (472, "ERR_UNKNOWNMODE"),
    (477, "ERR_NOCHANMODES"),
    (478, "ERR_BANLISTFULL"),
    (482, "ERR_CHANOPRIVSNEEDED"),
    (484, "ERR_RESTRICTED"),
    (485, "ERR_UNIQOPPRIVSNEEDED"),
    (501, "ERR_UMODEUNKNOWNFLAG"),
    (502, "ERR_USERSDONTMATCH"),
];

fn lookup(table: &[(u16, &'static str)], code: u16) -> Option<&'static str> {
    table.iter().find(|(c, _)| *c == code).map(|(_, name)| *name)
}

impl Lifecycle {
    pub(super) async fn dispatch(&self, event: Event) -> Flow {
        if self.shutdown.is_requested() {
            return Flow::Continue;
        }
        match event.kind {
            EventKind::Numeric(code) => self.on_numeric(code, &event),
            EventKind::Join => self.on_join(&event),
            EventKind::Part => self.on_part(&event),
            EventKind::Kick => self.on_kick(&event),
            EventKind::Quit => return self.on_quit(&event),
            EventKind::Nick => self.on_nick(&event),
            EventKind::Mode => self.on_mode(&event),
            EventKind::Invite => self.on_invite(&event),
            EventKind::Cap => self.on_cap(&event),
            EventKind::Authenticate => self.on_authenticate(&event),
            EventKind::Privmsg => self.bridge.on_privmsg(&event).await,
            EventKind::Topic => {
                info!(by = %event.nick(), channel = ?event.arg(0), topic = ?event.arg(1), "topic changed");
            }
            EventKind::Error => error!(raw = %event.raw, "Server error"),
            EventKind::Notice | EventKind::Ping | EventKind::Other(_) => {}
        }
        Flow::Continue
    }

    fn on_numeric(&self, code: u16, event: &Event) {
        match code {
            1 => self.on_welcome(event),
            4 => self.on_my_info(event),
            376 | 422 => self.on_motd_end(),
            433 => self.on_nick_in_use(event),
            471 | 473 | 474 => self.on_join_obstructed(code, event),
            353 => self.on_names(event),
            319 => self.on_whois_channels(event),
            903 => {
                info!("SASL authentication succeeded");
                self.end_sasl();
            }
            902 | 904 | 905 | 906 | 907 => {
                error!(code, raw = %event.raw, "SASL authentication failed");
                self.end_sasl();
            }
            _ => {
                if let Some(name) = lookup(WARN_NUMERICS, code) {
                    warn!(code, name, raw = %event.raw, "server rejected request");
                } else if let Some(name) = lookup(ERROR_NUMERICS, code) {
                    error!(code, name, raw = %event.raw, "server rejected request");
                } else {
                    debug!(code, "unhandled numeric");
                }
            }
        }
    }

    fn on_welcome(&self, event: &Event) {
        if let Some(nick) = event.arg(0) {
            self.session.set_nick(nick);
        }
        self.session.set_status(Status::Registered);
        info!(nick = %self.session.nick(), "Registered");
    }

    fn on_my_info(&self, event: &Event) {
        let user_modes = event.arg(3).unwrap_or_default();
        let channel_modes = event.arg(4).unwrap_or_default();
        self.session.record_modes(user_modes, channel_modes);
        debug!(user_modes, channel_modes, "server modes");
    }

    fn on_motd_end(&self) {
        let nick = self.session.nick();
        if self.session.has_user_mode(BOT_MODE) {
            self.handle.set_mode(&nick, &format!("+{BOT_MODE}"));
        } else {
            info!("Server does not offer a bot mode");
        }

        let irc = &self.config.irc;
        if let Some(password) = irc.credential() {
            if !irc.uses_sasl() && !self.session.nick_unavailable() {
                info!("Identifying via NickServ");
                self.outbound.enqueue(OutboundEnvelope::new(
                    NICKSERV,
                    format!("identify {} {password}", irc.nick),
                ));
            }
        }

        for channel in &irc.channels {
            info!(%channel, "Joining");
            self.handle.join(channel);
        }
        self.session.set_status(Status::Joining);
    }

    fn on_nick_in_use(&self, event: &Event) {
        error!(raw = %event.raw, "433 ERR_NICKNAMEINUSE");
        self.session.set_nick_unavailable(true);

        // Still unregistered: take a fallback now so registration completes.
        if self.session.status() == Status::Connecting {
            let tried = event.arg(1).map_or_else(|| self.session.nick(), str::to_owned);
            let fallback = format!("{tried}_");
            self.session.set_nick(&fallback);
            self.handle.set_nick(&fallback);
        }

        let handle = self.handle.clone();
        let wanted = self.config.irc.nick.clone();
        self.after(self.cooldowns.nick_retry, "nick retry", move || {
            handle.set_nick(&wanted);
        });
    }

    fn on_join_obstructed(&self, code: u16, event: &Event) {
        let Some(channel) = event.arg(1).map(str::to_owned) else {
            return;
        };
        warn!(code, %channel, "Cannot join channel, will retry");
        if !self.config.irc.is_configured_channel(&channel) {
            info!(%channel, "Not a configured channel, not rejoining");
            return;
        }
        let handle = self.handle.clone();
        self.after(self.cooldowns.obstruction, "rejoin", move || {
            handle.join(&channel);
        });
    }

    fn on_names(&self, event: &Event) {
        let Some(channel) = event.arg(2) else {
            return;
        };
        for entry in event.trailing().split_whitespace() {
            let (token, nick) = split_status_prefix(entry);
            self.privileges.set(channel, nick, &token);
        }
        debug!(%channel, members = self.privileges.member_count(channel), "names");
    }

    fn on_whois_channels(&self, event: &Event) {
        let Some(nick) = event.arg(1) else {
            return;
        };
        for entry in event.trailing().split_whitespace() {
            let (token, channel) = split_channel_status(entry);
            self.privileges.set(channel, nick, &token);
        }
    }

    fn on_join(&self, event: &Event) {
        let Some(channel) = event.arg(0) else {
            return;
        };
        let nick = event.nick();
        if self.session.is_me(nick) {
            info!(%channel, "Joined");
            self.session.mark_joined(channel);
            let configured = &self.config.irc.channels;
            if self.session.status() == Status::Joining
                && configured.iter().all(|c| self.session.is_joined(c))
            {
                self.session.set_status(Status::Steady);
                info!(channels = configured.len(), "All channels joined");
            }
        } else {
            info!(%nick, %channel, "user joined");
            self.privileges.set(channel, nick, "");
            self.handle.whois(nick);
        }
    }

    fn on_part(&self, event: &Event) {
        let Some(channel) = event.arg(0) else {
            return;
        };
        let nick = event.nick();
        if self.session.is_me(nick) {
            info!(%channel, "Parted");
            self.privileges.delete_channel(channel);
            self.session.mark_left(channel);
        } else {
            info!(%nick, %channel, "user parted");
            self.privileges.delete_user(channel, nick);
        }
    }

    fn on_kick(&self, event: &Event) {
        let (Some(channel), Some(victim)) = (event.arg(0), event.arg(1)) else {
            return;
        };
        if self.session.is_me(victim) {
            warn!(by = %event.nick(), %channel, "Kicked, rejoining after cooldown");
            self.privileges.delete_channel(channel);
            self.session.mark_left(channel);
            let handle = self.handle.clone();
            let channel = channel.to_owned();
            self.after(self.cooldowns.kick, "rejoin after kick", move || {
                handle.join(&channel);
            });
        } else {
            info!(by = %event.nick(), %victim, %channel, "user kicked");
            self.privileges.delete_user(channel, victim);
        }
    }

    fn on_quit(&self, event: &Event) -> Flow {
        let nick = event.nick();
        if self.session.is_me(nick) {
            info!("Quit acknowledged");
            return Flow::EndSession;
        }
        info!(%nick, reason = %event.trailing(), "user quit");
        self.privileges.purge_user(nick);
        Flow::Continue
    }

    fn on_nick(&self, event: &Event) {
        let old = event.nick();
        let Some(new) = event.arg(0) else {
            return;
        };
        let irc = &self.config.irc;

        if self.session.is_me(old) {
            info!(%old, %new, "Own nick changed");
            self.session.set_nick(new);
        } else {
            info!(%old, %new, "user renamed");
        }

        let regained = irc_eq(new, &irc.nick) && self.session.is_me(new);
        if irc_eq(old, &irc.nick) || regained {
            self.session.set_nick_unavailable(false);
            if let Some(password) = irc.credential() {
                info!("Configured nick changed hands, identifying via NickServ");
                self.outbound.enqueue(OutboundEnvelope::new(
                    NICKSERV,
                    format!("identify {} {password}", irc.nick),
                ));
            }
        }

        self.privileges.purge_user(old);
        self.handle.whois(new);
    }

    fn on_mode(&self, event: &Event) {
        let (Some(target), Some(modes)) = (event.arg(0), event.arg(1)) else {
            return;
        };
        if !target.starts_with(['#', '&', '!', '+']) {
            debug!(%target, %modes, "user mode change");
            return;
        }
        info!(by = %event.nick(), channel = %target, %modes, "mode change");
        for change in member_changes(modes, &event.args[2..]) {
            self.privileges.set(target, &change.nick, &change.token);
        }
    }

    fn on_invite(&self, event: &Event) {
        let Some(channel) = event.arg(1) else {
            return;
        };
        info!(by = %event.nick(), %channel, "Invited, joining");
        self.handle.join(channel);
    }

    fn on_cap(&self, event: &Event) {
        let subcommand = event.arg(1).unwrap_or_default();
        let caps = event.trailing();
        match subcommand {
            "ACK" if caps.split_whitespace().any(|c| c == "sasl") => {
                debug!("sasl acknowledged");
                self.handle.send(Message::authenticate("PLAIN"));
            }
            "NAK" => {
                warn!(%caps, "Server refused capability");
                self.end_sasl();
            }
            _ => debug!(%subcommand, %caps, "cap"),
        }
    }

    fn on_authenticate(&self, event: &Event) {
        if event.arg(0) != Some("+") || !self.session.sasl_pending() {
            return;
        }
        let irc = &self.config.irc;
        let Some(password) = irc.credential() else {
            self.end_sasl();
            return;
        };
        for chunk in chunk_payload(&encode_plain(&irc.user, password)) {
            self.handle.send(Message::authenticate(chunk));
        }
    }

    fn end_sasl(&self) {
        if self.session.sasl_pending() {
            self.session.set_sasl_pending(false);
            self.handle.send(Message::cap("END", None));
        }
    }
}

//! Bot commands (/addsource, /setdest, /startwork, etc).
//!
//! Handles command parsing and execution. Every command runs as one locked
//! read-modify-write on the settings store: authorize, validate arguments,
//! apply. Rejections never touch the store.

use std::sync::Arc;

use tracing::{debug, error, info};

use crate::common::error::CommandError;
use crate::common::messages::CommandEvent;
use crate::common::types::{ChannelRef, UserId};
use crate::store::{ConfigStore, Mutation, Settings};

use super::auth::{authorize, Tier};

/// Longest command line we bother parsing.
const MAX_COMMAND_LENGTH: usize = 256;

const GREETING: &str = "Hello! I copy new text-only messages from your configured public \
                        source channels to your destination channel.\n\n\
                        Use /list to see current settings.";

const HELP_TEXT: &str = "Available Commands:\n\
• /addsource @channel - Add a public source channel to watch\n\
• /removesource @channel - Remove a source channel from the watch list\n\
• /setdest @channel - Set or change the destination channel\n\
• /addadmin @username - Add another admin (owner only)\n\
• /list - Show sources, destination and admins\n\
• /startwork - Start copying new text messages\n\
• /stopwork - Stop copying (settings stay saved)";

/// Recognized command tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    Start,
    Help,
    AddSource,
    RemoveSource,
    SetDest,
    AddAdmin,
    List,
    StartWork,
    StopWork,
}

impl CommandKind {
    /// Match a lowercased command token (without the leading `/`).
    fn from_token(token: &str) -> Option<Self> {
        match token {
            "start" => Some(Self::Start),
            "help" => Some(Self::Help),
            "addsource" => Some(Self::AddSource),
            "removesource" => Some(Self::RemoveSource),
            "setdest" => Some(Self::SetDest),
            "addadmin" => Some(Self::AddAdmin),
            "list" => Some(Self::List),
            "startwork" => Some(Self::StartWork),
            "stopwork" => Some(Self::StopWork),
            _ => None,
        }
    }

    pub fn tier(self) -> Tier {
        match self {
            Self::Start | Self::Help => Tier::Public,
            Self::AddAdmin => Tier::Owner,
            _ => Tier::Admin,
        }
    }

    fn arity(self) -> usize {
        match self {
            Self::AddSource | Self::RemoveSource | Self::SetDest | Self::AddAdmin => 1,
            _ => 0,
        }
    }

    fn usage(self) -> &'static str {
        match self {
            Self::Start => "/start",
            Self::Help => "/help",
            Self::AddSource => "/addsource @channelusername",
            Self::RemoveSource => "/removesource @channelusername",
            Self::SetDest => "/setdest @yourchannelusername",
            Self::AddAdmin => "/addadmin @username",
            Self::List => "/list",
            Self::StartWork => "/startwork",
            Self::StopWork => "/stopwork",
        }
    }
}

/// A command token with its raw arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub kind: CommandKind,
    pub args: Vec<String>,
}

/// A fully validated command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start,
    Help,
    AddSource(ChannelRef),
    RemoveSource(ChannelRef),
    SetDestination(ChannelRef),
    AddAdmin(String),
    List,
    StartWork,
    StopWork,
}

impl Command {
    /// Check arity and argument format.
    fn from_invocation(invocation: &Invocation) -> Result<Self, CommandError> {
        let kind = invocation.kind;
        if invocation.args.len() != kind.arity() {
            return Err(CommandError::Usage(kind.usage()));
        }

        let channel = || {
            ChannelRef::parse(&invocation.args[0]).map_err(|e| {
                CommandError::InvalidChannel(format!("{}. Usage: {}", e, kind.usage()))
            })
        };

        Ok(match kind {
            CommandKind::Start => Command::Start,
            CommandKind::Help => Command::Help,
            CommandKind::AddSource => Command::AddSource(channel()?),
            CommandKind::RemoveSource => Command::RemoveSource(channel()?),
            CommandKind::SetDest => Command::SetDestination(channel()?),
            CommandKind::AddAdmin => {
                let username = invocation.args[0].trim().trim_start_matches('@');
                if username.is_empty() {
                    return Err(CommandError::Usage(kind.usage()));
                }
                Command::AddAdmin(username.to_string())
            }
            CommandKind::List => Command::List,
            CommandKind::StartWork => Command::StartWork,
            CommandKind::StopWork => Command::StopWork,
        })
    }
}

/// Result of applying a command to the settings.
enum Applied {
    Changed(String),
    Unchanged(String),
}

/// Parse `/command[@botname] args...`.
///
/// Returns `None` for non-commands, unknown commands and commands addressed
/// to a different bot.
pub fn parse_invocation(text: &str, bot_username: Option<&str>) -> Option<Invocation> {
    let text = text.trim();
    if text.len() > MAX_COMMAND_LENGTH {
        return None;
    }

    let mut parts = text.split_whitespace();
    let token = parts.next()?.strip_prefix('/')?;

    let (name, target) = match token.split_once('@') {
        Some((name, target)) => (name, Some(target)),
        None => (token, None),
    };
    if let (Some(target), Some(me)) = (target, bot_username) {
        if !target.eq_ignore_ascii_case(me) {
            return None;
        }
    }

    let kind = CommandKind::from_token(&name.to_lowercase())?;
    Some(Invocation {
        kind,
        args: parts.map(String::from).collect(),
    })
}

/// Command dispatcher for the bot.
pub struct CommandDispatcher {
    store: Arc<ConfigStore>,
    /// Our own username, for `/command@botname` addressing.
    bot_username: Option<String>,
}

impl CommandDispatcher {
    pub fn new(store: Arc<ConfigStore>, bot_username: Option<String>) -> Self {
        Self {
            store,
            bot_username,
        }
    }

    /// Parse and execute a command.
    ///
    /// Returns the reply text, or `None` if the message was not a command for us.
    pub async fn dispatch(&self, event: &CommandEvent) -> Option<String> {
        let invocation = parse_invocation(&event.raw_text, self.bot_username.as_deref())?;
        let kind = invocation.kind;
        info!(actor = event.actor_id, command = ?kind, "Processing command");

        let reply = match self.execute(event.actor_id, invocation).await {
            Ok(reply) => reply,
            Err(CommandError::Storage(e)) => {
                error!(command = ?kind, "Failed to save settings: {}", e);
                CommandError::Storage(e).to_string()
            }
            Err(e) => {
                debug!(actor = event.actor_id, command = ?kind, "Command rejected: {:?}", e);
                e.to_string()
            }
        };
        Some(reply)
    }

    async fn execute(&self, actor: UserId, invocation: Invocation) -> Result<String, CommandError> {
        let tier = invocation.kind.tier();
        self.store
            .update(|settings| {
                let result = authorize(tier, actor, settings)
                    .and_then(|()| Command::from_invocation(&invocation))
                    .and_then(|command| apply(command, settings));
                match result {
                    Ok(Applied::Changed(reply)) => Mutation::Commit(Ok(reply)),
                    Ok(Applied::Unchanged(reply)) => Mutation::Skip(Ok(reply)),
                    Err(e) => Mutation::Skip(Err(e)),
                }
            })
            .await?
    }
}

/// Apply an authorized, validated command to the settings.
fn apply(command: Command, settings: &mut Settings) -> Result<Applied, CommandError> {
    match command {
        Command::Start => Ok(Applied::Unchanged(GREETING.to_string())),
        Command::Help => Ok(Applied::Unchanged(HELP_TEXT.to_string())),
        Command::AddSource(channel) => {
            if settings.source_channels.contains(&channel) {
                return Err(CommandError::Duplicate(channel));
            }
            let reply = format!("✅ Added {} as source channel.", channel);
            settings.source_channels.push(channel);
            Ok(Applied::Changed(reply))
        }
        Command::RemoveSource(channel) => {
            match settings.source_channels.iter().position(|c| *c == channel) {
                Some(index) => {
                    settings.source_channels.remove(index);
                    Ok(Applied::Changed(format!(
                        "✅ Removed {} from source channels.",
                        channel
                    )))
                }
                None => Err(CommandError::NotFound(channel)),
            }
        }
        Command::SetDestination(channel) => {
            if settings.destination_channel.as_ref() == Some(&channel) {
                return Err(CommandError::AlreadySet(channel));
            }
            let reply = format!("✅ Destination channel set to {}.", channel);
            settings.destination_channel = Some(channel);
            Ok(Applied::Changed(reply))
        }
        // Usernames cannot be resolved to ids here, see CommandError::AdminResolution.
        Command::AddAdmin(username) => Err(CommandError::AdminResolution(username)),
        Command::List => Ok(Applied::Unchanged(settings.describe())),
        Command::StartWork => {
            if settings.working {
                return Ok(Applied::Unchanged(
                    "Bot is already working (copying messages).".to_string(),
                ));
            }
            settings.working = true;
            let mut reply = "✅ Bot started copying new text messages.".to_string();
            if settings.destination_channel.is_none() {
                reply.push_str("\nNote: no destination channel is set yet, use /setdest.");
            }
            Ok(Applied::Changed(reply))
        }
        Command::StopWork => {
            if !settings.working {
                return Ok(Applied::Unchanged("Bot is already stopped.".to_string()));
            }
            settings.working = false;
            Ok(Applied::Changed("🛑 Bot stopped copying messages.".to_string()))
        }
    }
}

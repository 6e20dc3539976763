use crate::{FeedError, Result as FeedErrorResult};

/// Postgres truncates identifiers beyond this length
pub const MAX_CHANNEL_LEN: usize = 63;

/// Accept only `[A-Za-z_][A-Za-z0-9_]{0,62}`.
#[track_caller]
pub fn validate_channel_name(channel: &str) -> FeedErrorResult<()> {
    let mut chars = channel.chars();

    let Some(first) = chars.next() else {
        return Err(FeedError::invalid_channel(channel, "channel name is empty"));
    };

    if !(first.is_ascii_alphabetic() || first == '_') {
        return Err(FeedError::invalid_channel(
            channel,
            "must start with a letter or underscore",
        ));
    }

    if let Some(bad) = chars.find(|c| !(c.is_ascii_alphanumeric() || *c == '_')) {
        return Err(FeedError::invalid_channel(
            channel,
            format!("contains invalid character {:?}", bad),
        ));
    }

    if channel.len() > MAX_CHANNEL_LEN {
        return Err(FeedError::invalid_channel(
            channel,
            format!("longer than {} characters", MAX_CHANNEL_LEN),
        ));
    }

    Ok(())
}

/// Double-quote an identifier, doubling embedded quotes.
pub fn quote_identifier(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

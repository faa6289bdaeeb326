//! Raw text encoding of items.
//!
//! # Layout
//!
//! ```text
//! n{id, zero-padded to ID_WIDTH}{json body}   note
//! l{json body}                                 list
//! t{json body}                                 timer
//! ```
//!
//! Bodies are compact `serde_json`, so a payload never contains a literal
//! newline and can sit at the end of a journal line. The note id field is
//! padded to [`ID_WIDTH`] digits; wider ids are written in full and still
//! decode because the JSON body always starts with `{`.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{ItemHandle, List, Note, TimerInfo};
use crate::error::ErrorCode;

/// Width of the note identifier field. Note ids are creation times in
/// epoch milliseconds, which fit 13 digits until the year 2286.
pub const ID_WIDTH: usize = 13;

/// Identifier of the singleton timer item.
pub const TIMER_ID: &str = "timer";

const NOTE_TAG: char = 'n';
const LIST_TAG: char = 'l';
const TIMER_TAG: char = 't';

/// Errors produced while decoding an item payload.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ItemError {
    #[error("item payload is empty")]
    Empty,

    #[error("unknown item tag '{0}': expected one of 'n', 'l', 't'")]
    UnknownTag(char),

    #[error("malformed note id '{0}'")]
    MalformedId(String),

    #[error("invalid {item} body: {details}")]
    InvalidBody {
        item: &'static str,
        details: String,
    },
}

impl ItemError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        ErrorCode::MalformedItem
    }
}

/// Note fields other than the id, which lives in the fixed-width prefix.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct NoteBodyRef<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    color: Option<&'a str>,
    text: &'a str,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    planned: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    completed_on: Option<NaiveDate>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct NoteBody {
    #[serde(default)]
    color: Option<String>,
    text: String,
    #[serde(default)]
    planned: bool,
    #[serde(default)]
    completed_on: Option<NaiveDate>,
}

/// Encode an item into its raw payload.
///
/// A [`ItemHandle::Raw`] payload is returned unchanged.
#[must_use]
pub fn encode_item(item: &ItemHandle) -> String {
    match item {
        ItemHandle::Raw(raw) => raw.clone(),
        ItemHandle::Note(note) => {
            let body = body_json(&NoteBodyRef {
                color: note.color.as_deref(),
                text: &note.text,
                planned: note.planned,
                completed_on: note.completed_on,
            });
            format!("{NOTE_TAG}{:0width$}{body}", note.id, width = ID_WIDTH)
        }
        ItemHandle::List(list) => format!("{LIST_TAG}{}", body_json(list)),
        ItemHandle::Timer(timer) => format!("{TIMER_TAG}{}", body_json(timer)),
    }
}

/// Decode a raw payload into a typed [`ItemHandle`].
///
/// # Errors
///
/// Returns [`ItemError`] if the tag is unknown, the note id is not a
/// decimal number, or the JSON body does not match the item schema.
pub fn decode_item(raw: &str) -> Result<ItemHandle, ItemError> {
    let mut chars = raw.chars();
    let tag = chars.next().ok_or(ItemError::Empty)?;
    let rest = chars.as_str();

    match tag {
        NOTE_TAG => {
            let split = rest
                .find(|c: char| !c.is_ascii_digit())
                .unwrap_or(rest.len());
            let (id_raw, body) = rest.split_at(split);
            let id: u64 = id_raw
                .parse()
                .map_err(|_| ItemError::MalformedId(id_raw.to_string()))?;
            let body: NoteBody = parse_body("note", body)?;
            Ok(ItemHandle::Note(Note {
                id,
                color: body.color,
                text: body.text,
                planned: body.planned,
                completed_on: body.completed_on,
            }))
        }
        LIST_TAG => Ok(ItemHandle::List(parse_body::<List>("list", rest)?)),
        TIMER_TAG => Ok(ItemHandle::Timer(parse_body::<TimerInfo>("timer", rest)?)),
        other => Err(ItemError::UnknownTag(other)),
    }
}

fn parse_body<T: for<'de> Deserialize<'de>>(item: &'static str, body: &str) -> Result<T, ItemError> {
    serde_json::from_str(body).map_err(|e| ItemError::InvalidBody {
        item,
        details: e.to_string(),
    })
}

fn body_json<T: Serialize>(body: &T) -> String {
    // Plain structs with string keys always serialize.
    serde_json::to_string(body).unwrap_or_else(|e| {
        tracing::error!(error = %e, "item body failed to serialize");
        "{}".to_string()
    })
}

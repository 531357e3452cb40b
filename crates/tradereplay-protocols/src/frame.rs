//! Socket framing for contexts connected over the bridge.
//!
//! A client opens with a [`Hello`] naming its tab (or none for the popup),
//! then sends [`RequestFrame`]s. The server answers each with a
//! [`ServerFrame::Reply`] carrying the same id, and may interleave
//! [`ServerFrame::Push`] frames at any time.

use serde::{Deserialize, Serialize};

use crate::message::{Push, Request, Response};
use crate::types::TabInfo;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Hello {
    #[serde(default)]
    pub tab: Option<TabInfo>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestFrame {
    pub id: u64,
    pub request: Request,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ServerFrame {
    Reply { id: u64, response: Response },
    Push { push: Push },
}

use encoding_rs::Encoding;

use crate::error::Result;
use crate::text::encoding_for_label;
use crate::transcode::{MissPolicy, Mode};

/// Settings for one run over one or more message files.
#[derive(Debug, Clone, Copy)]
pub struct RunConfig {
    pub mode: Mode,
    pub policy: MissPolicy,
    /// Encoding of the table and message files. Output is always UTF-8.
    pub encoding: &'static Encoding,
}

impl RunConfig {
    pub fn new(mode: Mode) -> Self {
        Self {
            mode,
            policy: MissPolicy::default(),
            encoding: encoding_rs::UTF_8,
        }
    }

    pub fn with_policy(mut self, policy: MissPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_encoding_label(mut self, label: &str) -> Result<Self> {
        self.encoding = encoding_for_label(label)?;
        Ok(self)
    }
}

// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::engine::EngineError;
use serde_json::Value;
use std::fmt::{Display, Formatter};

/// One call on the engine's control surface.
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    SetOption(String),
    Compile(String),
    ReadScore(String),
    InputMessage(String),
    Start,
    Stop,
    Reset,
    PerformBlock,
    SampleRate,
    BlockSize,
    OutputChannels,
    SetControlChannel { name: String, value: f64 },
    GetControlChannel(String),
}

impl Operation {
    /// Every operation name, identical for all strategies.
    pub const NAMES: [&'static str; 13] = [
        "set_option",
        "compile",
        "read_score",
        "input_message",
        "start",
        "stop",
        "reset",
        "perform_block",
        "sample_rate",
        "block_size",
        "output_channels",
        "set_control_channel",
        "get_control_channel",
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::SetOption(_) => "set_option",
            Self::Compile(_) => "compile",
            Self::ReadScore(_) => "read_score",
            Self::InputMessage(_) => "input_message",
            Self::Start => "start",
            Self::Stop => "stop",
            Self::Reset => "reset",
            Self::PerformBlock => "perform_block",
            Self::SampleRate => "sample_rate",
            Self::BlockSize => "block_size",
            Self::OutputChannels => "output_channels",
            Self::SetControlChannel { .. } => "set_control_channel",
            Self::GetControlChannel(_) => "get_control_channel",
        }
    }

    /// Build an operation from a name and positional JSON arguments.
    pub fn from_call(name: &str, args: &[Value]) -> Result<Self, EngineError> {
        let op = match name {
            "set_option" => Self::SetOption(text_arg(name, args)?),
            "compile" => Self::Compile(text_arg(name, args)?),
            "read_score" => Self::ReadScore(text_arg(name, args)?),
            "input_message" => Self::InputMessage(text_arg(name, args)?),
            "start" => no_args(name, args, Self::Start)?,
            "stop" => no_args(name, args, Self::Stop)?,
            "reset" => no_args(name, args, Self::Reset)?,
            "perform_block" => no_args(name, args, Self::PerformBlock)?,
            "sample_rate" => no_args(name, args, Self::SampleRate)?,
            "block_size" => no_args(name, args, Self::BlockSize)?,
            "output_channels" => no_args(name, args, Self::OutputChannels)?,
            "set_control_channel" => match args {
                [Value::String(channel), value] => Self::SetControlChannel {
                    name: channel.clone(),
                    value: value
                        .as_f64()
                        .ok_or_else(|| invalid(name, "value must be a number"))?,
                },
                _ => return Err(invalid(name, "expected (name: string, value: number)")),
            },
            "get_control_channel" => Self::GetControlChannel(text_arg(name, args)?),
            _ => return Err(EngineError::UnknownOperation(name.to_string())),
        };
        Ok(op)
    }
}

impl Display for Operation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

fn invalid(operation: &str, reason: &str) -> EngineError {
    EngineError::InvalidArguments {
        operation: operation.to_string(),
        reason: reason.to_string(),
    }
}

fn text_arg(operation: &str, args: &[Value]) -> Result<String, EngineError> {
    match args {
        [Value::String(text)] => Ok(text.clone()),
        _ => Err(invalid(operation, "expected a single string argument")),
    }
}

fn no_args(operation: &str, args: &[Value], op: Operation) -> Result<Operation, EngineError> {
    if args.is_empty() {
        Ok(op)
    } else {
        Err(invalid(operation, "takes no arguments"))
    }
}

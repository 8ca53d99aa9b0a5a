//! Commands that can be sent to the meter.

use std::ops::RangeInclusive;

use crate::constants::*;
use crate::error::CommandError;

/// Commands that can be sent to the meter.
///
/// Every command is a single byte. Only [`Command::RequestData`] gets a
/// reply; the others are fire and forget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Request a data dump.
    RequestData,

    /// Go to the next screen.
    ScreenNext,

    /// Go to the previous screen (UM25C/UM34C).
    ScreenPrevious,

    /// Rotate the screen.
    ScreenRotate,

    /// Set the screen timeout.
    ScreenTimeout {
        /// Minutes before the screen turns off, 0-9.
        minutes: i32,
    },

    /// Set the screen brightness.
    ScreenBrightness {
        /// 0 (dim) to 5 (full).
        level: i32,
    },

    /// Set the current above which recording runs.
    RecordThreshold {
        /// Threshold in mA, 0-300, sent with 10 mA resolution.
        milliamps: i32,
    },

    /// Select a data group (UM25C/UM34C).
    SelectDataGroup {
        /// Group index, 0-9.
        group: i32,
    },

    /// Switch to the next data group (UM24C). Shares its byte with
    /// [`Command::ScreenPrevious`].
    NextDataGroup,

    /// Clear the current data group.
    ClearDataGroup,
}

impl Command {
    /// Get the opcode (or opcode base for parameterized commands).
    pub fn code(&self) -> u8 {
        match self {
            Command::RequestData => CMD_REQUEST_DATA,
            Command::ScreenNext => CMD_SCREEN_NEXT,
            Command::ScreenPrevious => CMD_SCREEN_PREVIOUS,
            Command::ScreenRotate => CMD_SCREEN_ROTATE,
            Command::ScreenTimeout { .. } => CMD_SCREEN_TIMEOUT_BASE,
            Command::ScreenBrightness { .. } => CMD_SCREEN_BRIGHTNESS_BASE,
            Command::RecordThreshold { .. } => CMD_RECORD_THRESHOLD_BASE,
            Command::SelectDataGroup { .. } => CMD_DATA_GROUP_SELECT_BASE,
            Command::NextDataGroup => CMD_DATA_GROUP_NEXT,
            Command::ClearDataGroup => CMD_DATA_GROUP_CLEAR,
        }
    }

    /// Short name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Command::RequestData => "request_data",
            Command::ScreenNext => "screen_next",
            Command::ScreenPrevious => "screen_previous",
            Command::ScreenRotate => "screen_rotate",
            Command::ScreenTimeout { .. } => "screen_timeout",
            Command::ScreenBrightness { .. } => "screen_brightness",
            Command::RecordThreshold { .. } => "record_threshold",
            Command::SelectDataGroup { .. } => "data_group_select",
            Command::NextDataGroup => "data_group_next",
            Command::ClearDataGroup => "data_group_clear",
        }
    }

    /// Encode the command to its wire byte.
    ///
    /// Fails if a parameter is out of range; nothing should be sent then.
    pub fn encode(&self) -> Result<u8, CommandError> {
        let offset = match *self {
            Command::ScreenTimeout { minutes } => {
                check_range("screen timeout", minutes, 0..=MAX_SCREEN_TIMEOUT_MINUTES)?
            }
            Command::ScreenBrightness { level } => {
                check_range("screen brightness", level, 0..=MAX_SCREEN_BRIGHTNESS)?
            }
            Command::RecordThreshold { milliamps } => {
                check_range("record threshold", milliamps, 0..=MAX_RECORD_THRESHOLD_MA)?;
                // Ties go to even, so 5 mA -> 0 and 15 mA -> 2.
                (f64::from(milliamps) / 10.0).round_ties_even() as u8
            }
            Command::SelectDataGroup { group } => {
                check_range("data group", group, 0..=(DATA_GROUP_COUNT as i32 - 1))?
            }
            _ => 0,
        };
        Ok(self.code() + offset)
    }
}

fn check_range(
    parameter: &'static str,
    value: i32,
    range: RangeInclusive<i32>,
) -> Result<u8, CommandError> {
    if range.contains(&value) {
        Ok(value as u8)
    } else {
        Err(CommandError::OutOfRange {
            parameter,
            value,
            min: *range.start(),
            max: *range.end(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_commands() {
        assert_eq!(Command::RequestData.encode(), Ok(0xF0));
        assert_eq!(Command::ScreenNext.encode(), Ok(0xF1));
        assert_eq!(Command::ScreenRotate.encode(), Ok(0xF2));
        assert_eq!(Command::ScreenPrevious.encode(), Ok(0xF3));
        assert_eq!(Command::ClearDataGroup.encode(), Ok(0xF4));
    }

    #[test]
    fn test_next_data_group_shares_previous_screen_byte() {
        assert_eq!(
            Command::NextDataGroup.encode(),
            Command::ScreenPrevious.encode()
        );
        assert_ne!(Command::NextDataGroup, Command::ScreenPrevious);
        assert_ne!(Command::NextDataGroup.name(), Command::ScreenPrevious.name());
    }

    #[test]
    fn test_screen_timeout() {
        for minutes in 0..=9 {
            assert_eq!(
                Command::ScreenTimeout { minutes }.encode(),
                Ok(0xE0 + minutes as u8)
            );
        }
        assert_eq!(
            Command::ScreenTimeout { minutes: -1 }.encode(),
            Err(CommandError::OutOfRange {
                parameter: "screen timeout",
                value: -1,
                min: 0,
                max: 9
            })
        );
        assert!(Command::ScreenTimeout { minutes: 10 }.encode().is_err());
    }

    #[test]
    fn test_screen_brightness() {
        assert_eq!(Command::ScreenBrightness { level: 0 }.encode(), Ok(0xD0));
        assert_eq!(Command::ScreenBrightness { level: 5 }.encode(), Ok(0xD5));
        assert!(Command::ScreenBrightness { level: -1 }.encode().is_err());
        assert!(Command::ScreenBrightness { level: 6 }.encode().is_err());
    }

    #[test]
    fn test_record_threshold() {
        let encode = |milliamps| Command::RecordThreshold { milliamps }.encode();
        assert_eq!(encode(0), Ok(0xB0));
        assert_eq!(encode(12), Ok(0xB1));
        assert_eq!(encode(16), Ok(0xB2));
        assert_eq!(encode(300), Ok(0xCE));
        assert!(encode(-1).is_err());
        assert!(encode(301).is_err());
    }

    #[test]
    fn test_record_threshold_rounds_half_to_even() {
        let encode = |milliamps| Command::RecordThreshold { milliamps }.encode();
        assert_eq!(encode(5), Ok(0xB0));
        assert_eq!(encode(15), Ok(0xB2));
        assert_eq!(encode(25), Ok(0xB2));
        assert_eq!(encode(35), Ok(0xB4));
    }

    #[test]
    fn test_select_data_group() {
        assert_eq!(Command::SelectDataGroup { group: 0 }.encode(), Ok(0xA0));
        assert_eq!(Command::SelectDataGroup { group: 9 }.encode(), Ok(0xA9));
        assert!(Command::SelectDataGroup { group: -1 }.encode().is_err());
        assert!(Command::SelectDataGroup { group: 10 }.encode().is_err());
    }

    #[test]
    fn test_out_of_range_message() {
        let err = Command::ScreenBrightness { level: 7 }.encode().unwrap_err();
        assert_eq!(err.to_string(), "screen brightness out of range: 7 not in 0..=5");
    }
}

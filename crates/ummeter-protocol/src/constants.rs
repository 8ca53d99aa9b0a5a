//! Protocol constants
//!
//! Command opcodes, model codes and frame geometry for the UM-series
//! protocol. Information from <https://sigrok.org/wiki/RDTech_UM_series>.

// ============================================================================
// Command Codes (host → meter)
// ============================================================================

/// Request a data dump. The meter replies with a [`FRAME_SIZE`] byte frame.
pub const CMD_REQUEST_DATA: u8 = 0xF0;
/// Go to the next screen.
pub const CMD_SCREEN_NEXT: u8 = 0xF1;
/// Rotate the screen.
pub const CMD_SCREEN_ROTATE: u8 = 0xF2;
/// Go to the previous screen (UM25C/UM34C).
pub const CMD_SCREEN_PREVIOUS: u8 = 0xF3;
/// Switch to the next data group (UM24C). Same byte as [`CMD_SCREEN_PREVIOUS`].
pub const CMD_DATA_GROUP_NEXT: u8 = 0xF3;
/// Clear the current data group.
pub const CMD_DATA_GROUP_CLEAR: u8 = 0xF4;

/// Screen timeout base, `+ minutes` (0-9).
pub const CMD_SCREEN_TIMEOUT_BASE: u8 = 0xE0;
/// Screen brightness base, `+ level` (0-5).
pub const CMD_SCREEN_BRIGHTNESS_BASE: u8 = 0xD0;
/// Recording threshold base, `+ round(mA / 10)` (0-30).
pub const CMD_RECORD_THRESHOLD_BASE: u8 = 0xB0;
/// Data group selection base, `+ group` (0-9, UM25C/UM34C).
pub const CMD_DATA_GROUP_SELECT_BASE: u8 = 0xA0;

// ============================================================================
// Command Parameter Limits
// ============================================================================

/// Maximum screen timeout in minutes.
pub const MAX_SCREEN_TIMEOUT_MINUTES: i32 = 9;
/// Maximum screen brightness level.
pub const MAX_SCREEN_BRIGHTNESS: i32 = 5;
/// Maximum recording threshold in milliamps.
pub const MAX_RECORD_THRESHOLD_MA: i32 = 300;

// ============================================================================
// Model Codes
// ============================================================================

/// Model code reported by the UM24C.
pub const MODEL_CODE_UM24C: u16 = 0x0963;
/// Model code reported by the UM25C.
pub const MODEL_CODE_UM25C: u16 = 0x09C9;
/// Model code reported by the UM34C.
pub const MODEL_CODE_UM34C: u16 = 0x0D4C;

// ============================================================================
// Frame Geometry
// ============================================================================

/// Size of a data dump in bytes.
pub const FRAME_SIZE: usize = 130;
/// Number of data groups held by the meter.
pub const DATA_GROUP_COUNT: usize = 10;
/// Size of one data group record (capacity + energy, both u32).
pub const DATA_GROUP_SIZE: usize = 8;
/// Offset of the first data group record.
pub const DATA_GROUP_OFFSET: usize = 16;

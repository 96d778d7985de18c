pub mod directory_entry;
pub mod drive;
pub mod operation;

pub use directory_entry::DirectoryEntry;
pub use drive::{DriveInfo, SystemInfo, UsageStats};
pub use operation::{
    BridgeCall, BridgeReply, BridgeResult, OperationName, OperationOutput, OperationRequest,
};

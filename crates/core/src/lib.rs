pub mod color;
pub mod config;
pub mod error;
pub mod flamechart;
pub mod memo;
pub mod model;
pub mod views;

pub use color::{ColorBucket, ColorBuckets};
pub use config::ViewConfig;
pub use error::{ConfigError, ProfileError};
pub use flamechart::{Flamechart, FlamechartMode, FlamechartRect};
pub use memo::{Memo, ShallowEq, memoize};
pub use model::{Frame, FrameInfo, FrameKey, Profile, ProfileBuilder, ValueUnit};

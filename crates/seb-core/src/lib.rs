pub mod channel;
pub mod control;
pub mod error;
pub mod metrics;
pub mod notify;
pub mod platforms;
pub mod sse;
pub mod state;
pub mod status;
pub mod tasks;

pub use channel::{Backoff, Channel, ChannelState};
pub use control::{ActionResponse, ControlAction};
pub use error::{FrameError, PayloadError};
pub use metrics::{ChartSnapshot, Sample, TimeSeriesBuffer, CHART_WINDOW};
pub use notify::{Notifier, TOAST_DURATION};
pub use platforms::{render_platforms, PlatformRenderPlan};
pub use sse::{SseEvent, SseFrameDecoder};
pub use state::DashboardState;
pub use status::{BotStatus, StatusSnapshot};
pub use tasks::{TaskListing, TaskRecord};

//! Value objects - Immutable objects defined by their attributes

mod skeleton;
mod subject;
mod token;

pub use skeleton::{RenderOutcome, SkeletonBundle, REST_POSE_CLIP};
pub use subject::{Direction, Subject, SubjectKind};
pub use token::{OutputToken, OUTPUT_TOKEN_LEN};

//! Hellabot domain types.
//!
//! Pure types shared by the engine: render subjects, skeleton bundles,
//! output tokens, selection tables, and the game records served by the
//! upstream data API. No I/O lives here.

pub mod entities;
pub mod error;
pub mod selection;
pub mod value_objects;

pub use entities::{
    BattleSkin, BlackboardEntry, Definition, DisplaySkin, Enemy, EnemyExcel, Item, ItemCost,
    ItemData, MasteryCost, Module, ModuleInfo, Operator, OperatorData, OperatorSkillRef, Phase,
    Skill, SkillLevel, SkillLevelUp, Skin, SpData, Stage, StageDifficulty, StageExcel,
};
pub use error::DomainError;
pub use selection::{
    clip_table, cost_page_table, skill_level_table, Choice, ChoiceTable, Control, ControlLayout,
    CostPage, MAX_MENU_OPTIONS, SKILL_LEVEL_LABELS, SKILL_LEVEL_TOKENS,
};
pub use value_objects::{
    Direction, OutputToken, RenderOutcome, SkeletonBundle, Subject, SubjectKind, OUTPUT_TOKEN_LEN,
    REST_POSE_CLIP,
};

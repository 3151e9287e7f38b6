//! Game-reference records consumed from the upstream data API.

mod catalog;
mod operator;
mod skill;

pub use catalog::{
    Definition, Enemy, EnemyExcel, Item, ItemData, Stage, StageDifficulty, StageExcel,
};
pub use operator::{
    BattleSkin, DisplaySkin, ItemCost, MasteryCost, Module, ModuleInfo, Operator, OperatorData,
    OperatorSkillRef, Phase, Skin, SkillLevelUp,
};
pub use skill::{BlackboardEntry, Skill, SkillLevel, SpData};

//! # 权限等级定义
//!
//! 审核流程只关心一个能力：操作人能否直接写入正式值

use serde::{Deserialize, Serialize};
use std::fmt;

/// 权限等级，按声明顺序全序比较
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PermissionLevel {
    Guest,
    Viewer,
    T0,
    T1,
    T2,
    T3,
    T4,
    T5,
    Admin,
}

impl PermissionLevel {
    const ALL: [Self; 9] = [
        Self::Guest,
        Self::Viewer,
        Self::T0,
        Self::T1,
        Self::T2,
        Self::T3,
        Self::T4,
        Self::T5,
        Self::Admin,
    ];

    /// 直接写入正式值所需的最低等级
    pub const MODERATOR: Self = Self::T4;

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Guest => "guest",
            Self::Viewer => "viewer",
            Self::T0 => "t0",
            Self::T1 => "t1",
            Self::T2 => "t2",
            Self::T3 => "t3",
            Self::T4 => "t4",
            Self::T5 => "t5",
            Self::Admin => "admin",
        }
    }

    /// 解析单个分组标识（忽略大小写，必须整词匹配）
    #[must_use]
    pub fn parse(token: &str) -> Option<Self> {
        let token = token.trim();
        Self::ALL
            .into_iter()
            .find(|level| level.as_str().eq_ignore_ascii_case(token))
    }

    /// 从分组字符串中解析出最高等级，例如 `"viewer,t4"` -> `T4`
    ///
    /// 未识别的分组被忽略，全部无法识别时为 `Guest`
    #[must_use]
    pub fn resolve(groups: &str) -> Self {
        groups
            .split(|c: char| c == ',' || c == ';' || c == '|' || c.is_whitespace())
            .filter_map(Self::parse)
            .max()
            .unwrap_or(Self::Guest)
    }

    /// 是否可以跳过审核直接写入正式值
    #[must_use]
    pub fn may_write_live(&self) -> bool {
        *self >= Self::MODERATOR
    }
}

impl fmt::Display for PermissionLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 操作人
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    /// 记录到 `created_by` / `updated_by` / `proposed_by` 的身份标识
    pub identity: String,
    pub level: PermissionLevel,
}

impl Actor {
    pub fn new(identity: impl Into<String>, level: PermissionLevel) -> Self {
        Self {
            identity: identity.into(),
            level,
        }
    }

    /// 从分组字符串构建操作人
    pub fn from_groups(identity: impl Into<String>, groups: &str) -> Self {
        Self::new(identity, PermissionLevel::resolve(groups))
    }

    /// 系统任务使用的操作人，本身不具备直接写入权限，是否可信由数据源决定
    pub fn system(identity: impl Into<String>) -> Self {
        Self::new(identity, PermissionLevel::Guest)
    }

    #[must_use]
    pub fn may_write_live(&self) -> bool {
        self.level.may_write_live()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_order() {
        assert!(PermissionLevel::Guest < PermissionLevel::Viewer);
        assert!(PermissionLevel::T3 < PermissionLevel::T4);
        assert!(PermissionLevel::T5 < PermissionLevel::Admin);
    }

    #[test]
    fn test_resolve_takes_highest_exact_token() {
        assert_eq!(PermissionLevel::resolve("viewer,T4"), PermissionLevel::T4);
        assert_eq!(PermissionLevel::resolve("t1 t3"), PermissionLevel::T3);
        assert_eq!(PermissionLevel::resolve("admin;t0"), PermissionLevel::Admin);
        // 子串不算匹配
        assert_eq!(PermissionLevel::resolve("t45,superadmin"), PermissionLevel::Guest);
        assert_eq!(PermissionLevel::resolve(""), PermissionLevel::Guest);
    }

    #[test]
    fn test_may_write_live() {
        assert!(!PermissionLevel::T3.may_write_live());
        assert!(PermissionLevel::T4.may_write_live());
        assert!(Actor::from_groups("alice", "t5").may_write_live());
        assert!(!Actor::system("cron自动任务").may_write_live());
    }
}

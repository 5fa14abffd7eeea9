//! 文档集合状态
//!
//! 有序的文档序列 + 按文件名索引的条目表。这里的所有操作都是纯状态变换：
//! 不做 I/O、不重试。异步响应通过 [`DocumentTicket`] 回写，票据过期（文件已删除，
//! 或删除后又以同名重新加入）时回写自动作废。

use crate::error::CollectionError;
use crate::models::{BrokenReason, DocumentEntry, DocumentHandle, Rotation};
use std::collections::{HashMap, HashSet};

/// 一次加入集合的凭证，异步结果回写时用它确认目标仍是同一个文件
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DocumentTicket {
    pub name: String,
    pub generation: u64,
}

/// 阻塞提交的原因
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockReason {
    Broken(BrokenReason),
    Locked,
    PasswordUnverified,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionState {
    max_files: usize,
    documents: Vec<DocumentHandle>,
    entries: HashMap<String, DocumentEntry>,
    next_generation: u64,
}

impl CollectionState {
    pub fn new(max_files: usize) -> Self {
        Self {
            max_files,
            documents: Vec::new(),
            entries: HashMap::new(),
            next_generation: 1,
        }
    }

    pub fn max_files(&self) -> usize {
        self.max_files
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// 按当前顺序排列的文档
    pub fn documents(&self) -> &[DocumentHandle] {
        &self.documents
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn entry(&self, name: &str) -> Option<&DocumentEntry> {
        self.entries.get(name)
    }

    pub fn handle(&self, name: &str) -> Option<&DocumentHandle> {
        self.documents.iter().find(|d| d.name() == name)
    }

    /// 当前条目对应的票据
    pub fn ticket(&self, name: &str) -> Option<DocumentTicket> {
        self.entries.get(name).map(|e| DocumentTicket {
            name: name.to_string(),
            generation: e.generation,
        })
    }

    pub fn is_current(&self, ticket: &DocumentTicket) -> bool {
        self.entries
            .get(&ticket.name)
            .map(|e| e.generation == ticket.generation)
            .unwrap_or(false)
    }

    // ========== 集合增删 ==========

    /// 追加一批文档
    ///
    /// 已在集合中的同名文件（以及同一批里重复的文件名）被忽略。
    /// 如果加入后会超过上限，整批拒绝，状态不变。
    ///
    /// # 返回
    /// 实际加入的文档票据，顺序与输入一致
    pub fn add(&mut self, handles: Vec<DocumentHandle>) -> Result<Vec<DocumentTicket>, CollectionError> {
        let mut seen = HashSet::new();
        let fresh: Vec<DocumentHandle> = handles
            .into_iter()
            .filter(|h| !self.entries.contains_key(h.name()) && seen.insert(h.name().to_string()))
            .collect();

        if self.documents.len() + fresh.len() > self.max_files {
            return Err(CollectionError::CapacityExceeded {
                max: self.max_files,
                current: self.documents.len(),
                requested: fresh.len(),
            });
        }

        let mut tickets = Vec::with_capacity(fresh.len());
        for handle in fresh {
            let generation = self.next_generation;
            self.next_generation += 1;
            self.entries
                .insert(handle.name().to_string(), DocumentEntry::new(generation));
            tickets.push(DocumentTicket {
                name: handle.name().to_string(),
                generation,
            });
            self.documents.push(handle);
        }

        Ok(tickets)
    }

    /// 删除文档及其全部元数据（密码、验证状态、加密标记、旋转）
    pub fn remove(&mut self, name: &str) -> Result<DocumentHandle, CollectionError> {
        let index = self.index_of(name)?;
        self.entries.remove(name);
        Ok(self.documents.remove(index))
    }

    /// 清空集合
    pub fn reset(&mut self) {
        self.documents.clear();
        self.entries.clear();
    }

    // ========== 密码与状态标记 ==========

    /// 记录用户提供的密码，验证状态随之清零
    pub fn set_password(&mut self, name: &str, password: impl Into<String>) -> Result<(), CollectionError> {
        let entry = self.entry_mut(name)?;
        entry.password = Some(password.into());
        entry.verified = false;
        Ok(())
    }

    /// 服务端确认密码可用，同时解除加密标记
    ///
    /// 没有密码时不做任何修改并返回 `false`。
    pub fn mark_verified(&mut self, name: &str) -> Result<bool, CollectionError> {
        let entry = self.entry_mut(name)?;
        if entry.password.is_none() {
            return Ok(false);
        }
        entry.verified = true;
        entry.locked = false;
        Ok(true)
    }

    /// 标记为损坏，已损坏时保留第一次的原因
    pub fn mark_broken(&mut self, name: &str, reason: BrokenReason) -> bool {
        match self.entries.get_mut(name) {
            Some(entry) if entry.broken.is_none() => {
                entry.broken = Some(reason);
                true
            }
            _ => false,
        }
    }

    /// 标记为加密
    ///
    /// 服务端报告加密意味着此前验证过的密码已不可信，`verified` 一并清除。
    pub fn mark_locked(&mut self, name: &str) -> bool {
        match self.entries.get_mut(name) {
            Some(entry) if !entry.locked => {
                entry.locked = true;
                entry.verified = false;
                true
            }
            _ => false,
        }
    }

    /// 把 423 返回的文件名并入加密集合（只增不减）
    ///
    /// # 返回
    /// 集合中找不到的文件名
    pub fn union_locked<I, S>(&mut self, names: I) -> Vec<String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut unattributed = Vec::new();
        for name in names {
            let name = name.as_ref();
            if self.contains(name) {
                self.mark_locked(name);
            } else if !unattributed.iter().any(|n: &String| n == name) {
                unattributed.push(name.to_string());
            }
        }
        unattributed
    }

    // ========== 异步结果回写 ==========

    pub fn apply_broken(&mut self, ticket: &DocumentTicket, reason: BrokenReason) -> bool {
        self.is_current(ticket) && self.mark_broken(&ticket.name, reason)
    }

    pub fn apply_locked(&mut self, ticket: &DocumentTicket) -> bool {
        self.is_current(ticket) && self.mark_locked(&ticket.name)
    }

    /// 密码检查通过后的回写：记录密码并标记已验证
    pub fn apply_verified(&mut self, ticket: &DocumentTicket, password: Option<&str>) -> bool {
        if !self.is_current(ticket) {
            return false;
        }
        let Some(entry) = self.entries.get_mut(&ticket.name) else {
            return false;
        };
        if let Some(password) = password {
            entry.password = Some(password.to_string());
        }
        if entry.password.is_some() {
            entry.verified = true;
        }
        entry.locked = false;
        true
    }

    // ========== 旋转与排序 ==========

    /// 顺时针旋转 90°
    pub fn rotate(&mut self, name: &str) -> Result<Rotation, CollectionError> {
        let entry = self.entry_mut(name)?;
        entry.rotation = entry.rotation.advance();
        Ok(entry.rotation)
    }

    pub fn set_rotation(&mut self, name: &str, rotation: Rotation) -> Result<(), CollectionError> {
        self.entry_mut(name)?.rotation = rotation;
        Ok(())
    }

    /// 按新顺序重排，`new_order` 是当前下标的一个排列
    pub fn reorder(&mut self, new_order: &[usize]) -> Result<(), CollectionError> {
        if new_order.len() != self.documents.len() {
            return Err(invalid_order("下标数量不匹配"));
        }

        let mut seen = vec![false; self.documents.len()];
        for &idx in new_order {
            if idx >= self.documents.len() {
                return Err(invalid_order("下标越界"));
            }
            if seen[idx] {
                return Err(invalid_order("下标重复"));
            }
            seen[idx] = true;
        }

        let reordered = new_order.iter().map(|&i| self.documents[i].clone()).collect();
        self.documents = reordered;
        Ok(())
    }

    /// 拖拽：把 `from` 位置的文档移动到 `to`
    pub fn move_document(&mut self, from: usize, to: usize) -> Result<(), CollectionError> {
        if from >= self.documents.len() || to >= self.documents.len() {
            return Err(invalid_order("下标越界"));
        }
        let handle = self.documents.remove(from);
        self.documents.insert(to, handle);
        Ok(())
    }

    // ========== 就绪判断 ==========

    /// 集合非空且每个条目都不阻塞
    pub fn is_ready(&self) -> bool {
        !self.is_empty() && self.entries.values().all(|e| !e.blocks_submission())
    }

    /// 每个阻塞文件的首要原因，按集合顺序；损坏优先于加密
    pub fn blocking_reasons(&self) -> Vec<(String, BlockReason)> {
        self.documents
            .iter()
            .filter_map(|doc| {
                let entry = self.entries.get(doc.name())?;
                let reason = if let Some(broken) = &entry.broken {
                    BlockReason::Broken(broken.clone())
                } else if entry.locked {
                    BlockReason::Locked
                } else if entry.has_unverified_password() {
                    BlockReason::PasswordUnverified
                } else {
                    return None;
                };
                Some((doc.name().to_string(), reason))
            })
            .collect()
    }

    pub fn locked_names(&self) -> Vec<String> {
        self.names_where(|e| e.locked)
    }

    pub fn broken_names(&self) -> Vec<String> {
        self.names_where(DocumentEntry::is_broken)
    }

    fn names_where(&self, pred: impl Fn(&DocumentEntry) -> bool) -> Vec<String> {
        self.documents
            .iter()
            .filter(|d| self.entries.get(d.name()).map(&pred).unwrap_or(false))
            .map(|d| d.name().to_string())
            .collect()
    }

    fn index_of(&self, name: &str) -> Result<usize, CollectionError> {
        self.documents
            .iter()
            .position(|d| d.name() == name)
            .ok_or_else(|| CollectionError::NotFound {
                name: name.to_string(),
            })
    }

    fn entry_mut(&mut self, name: &str) -> Result<&mut DocumentEntry, CollectionError> {
        self.entries
            .get_mut(name)
            .ok_or_else(|| CollectionError::NotFound {
                name: name.to_string(),
            })
    }
}

fn invalid_order(reason: &str) -> CollectionError {
    CollectionError::InvalidOrder {
        reason: reason.to_string(),
    }
}

//! 题板翻开/选中状态
//!
//! 每个渲染出来的题板各有一份：记录已翻开的题目下标和当前弹窗展示的题目

use std::collections::BTreeSet;

use crate::models::QuestionRecord;

/// 题板状态
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RevealBoard {
    question_count: usize,
    revealed: BTreeSet<usize>,
    selected: Option<usize>,
}

impl RevealBoard {
    pub fn new(question_count: usize) -> Self {
        Self {
            question_count,
            revealed: BTreeSet::new(),
            selected: None,
        }
    }

    /// 翻开并选中一道题
    ///
    /// 重复翻开同一道题不会改变已翻开集合，但会重新选中它。
    /// 下标越界时忽略并返回 `false`。
    pub fn reveal(&mut self, index: usize) -> bool {
        if index >= self.question_count {
            return false;
        }
        self.revealed.insert(index);
        self.selected = Some(index);
        true
    }

    /// 关闭弹窗，不影响已翻开集合
    pub fn close(&mut self) {
        self.selected = None;
    }

    pub fn is_revealed(&self, index: usize) -> bool {
        self.revealed.contains(&index)
    }

    pub fn revealed(&self) -> &BTreeSet<usize> {
        &self.revealed
    }

    pub fn revealed_count(&self) -> usize {
        self.revealed.len()
    }

    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    pub fn question_count(&self) -> usize {
        self.question_count
    }
}

/// 按分类分组（保持分类首次出现的顺序），附带题目原始下标
pub fn group_by_category(questions: &[QuestionRecord]) -> Vec<(&str, Vec<(usize, &QuestionRecord)>)> {
    let mut groups: Vec<(&str, Vec<(usize, &QuestionRecord)>)> = Vec::new();

    for (index, question) in questions.iter().enumerate() {
        match groups
            .iter_mut()
            .find(|(category, _)| *category == question.category.as_str())
        {
            Some((_, items)) => items.push((index, question)),
            None => groups.push((question.category.as_str(), vec![(index, question)])),
        }
    }

    groups
}

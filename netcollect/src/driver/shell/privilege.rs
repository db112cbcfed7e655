//! Navigation between a dialect's privilege levels.

use std::collections::{HashMap, VecDeque};

use regex::bytes::Regex;

use crate::dialect::Levels;

/// One command that moves the session to an adjacent level.
#[derive(Debug, Clone, Copy)]
pub struct Step<'d> {
    pub to: &'static str,
    pub command: &'static str,
    /// Present when the device may ask for a password before `to`.
    pub password_prompt: Option<&'d Regex>,
}

/// Tracks the session's current level and plans moves between levels.
///
/// Levels form a forest through their escalation parents; moves may go
/// either way along an edge.
#[derive(Debug)]
pub struct PrivilegeGraph<'d> {
    levels: &'d Levels,
    current: Option<&'static str>,
}

impl<'d> PrivilegeGraph<'d> {
    pub fn new(levels: &'d Levels) -> Self {
        Self {
            levels,
            current: None,
        }
    }

    /// Level last seen in a prompt.
    pub fn current(&self) -> Option<&'static str> {
        self.current
    }

    /// First level, in dialect order, whose prompt matches.
    pub fn classify(&self, prompt: &str) -> Option<&'static str> {
        self.levels
            .values()
            .find(|level| level.matches_prompt(prompt))
            .map(|level| level.name)
    }

    /// Classify `prompt` and remember the result as current.
    ///
    /// An unrecognised prompt leaves the current level unchanged.
    pub fn observe(&mut self, prompt: &str) -> Option<&'static str> {
        let name = self.classify(prompt)?;
        self.current = Some(name);
        Some(name)
    }

    fn adjacent(&self, name: &'static str) -> impl Iterator<Item = &'static str> + '_ {
        let parent = self.levels.get(name).and_then(|level| level.parent());
        let children = self
            .levels
            .values()
            .filter(move |level| level.parent() == Some(name))
            .map(|level| level.name);
        parent.into_iter().chain(children)
    }

    /// Direct move between adjacent levels.
    fn step(&self, from: &'static str, to: &'static str) -> Option<Step<'d>> {
        let levels: &'d Levels = self.levels;
        let up = levels.get(to)?.escalation.as_ref().filter(|e| e.from == from);
        if let Some(escalation) = up {
            return Some(Step {
                to,
                command: escalation.enter,
                password_prompt: escalation.password_prompt.as_ref(),
            });
        }
        let down = levels.get(from)?.escalation.as_ref().filter(|e| e.from == to)?;
        Some(Step {
            to,
            command: down.leave,
            password_prompt: None,
        })
    }

    /// Fewest-steps route from `from` to `to`.
    ///
    /// Empty when already there; `None` when the levels are unconnected or
    /// either name is unknown.
    pub fn route(&self, from: &str, to: &str) -> Option<Vec<Step<'d>>> {
        let (&start, _) = self.levels.get_key_value(from)?;
        let (&goal, _) = self.levels.get_key_value(to)?;

        let mut came_from: HashMap<&'static str, &'static str> = HashMap::new();
        let mut queue = VecDeque::from([start]);
        while let Some(name) = queue.pop_front() {
            if name == goal {
                break;
            }
            for next in self.adjacent(name) {
                if next != start && !came_from.contains_key(next) {
                    came_from.insert(next, name);
                    queue.push_back(next);
                }
            }
        }

        let mut hops = vec![goal];
        let mut cursor = goal;
        while cursor != start {
            cursor = *came_from.get(cursor)?;
            hops.push(cursor);
        }
        hops.reverse();

        hops.windows(2).map(|pair| self.step(pair[0], pair[1])).collect()
    }
}

use crate::error::Result;
use crate::logic::assignment::Assignment;
use crate::logic::encoding::Encoding;
use crate::logic::registry::Var;
use crate::logic::theory::Theory;
use itertools::iproduct;
use std::fmt::{Display, Formatter};
use std::ops::RangeInclusive;

pub type Task = u8;
pub type Slot = u8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TaskProp {
    /// The first task depends on the second, which must run earlier.
    DepOn(Task, Task),
    /// The task runs in the slot.
    At(Task, Slot),
}

impl Display for TaskProp {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DepOn(a, b) => write!(f, "t{a}>t{b}"),
            Self::At(t, p) => write!(f, "t{t}@p{p}"),
        }
    }
}

/// Tasks placed in slots, each task in exactly one slot and no slot holding
/// two tasks. Slots may outnumber tasks and then some stay empty.
///
/// Dependencies form a strict partial order, and a task never runs in an
/// earlier slot than a task it depends on.
#[derive(Debug, Clone)]
pub struct TaskSchedule {
    encoding: Encoding<TaskProp>,
    num_tasks: u8,
    num_slots: u8,
}

impl TaskSchedule {
    /// # Errors
    ///
    /// Propagates registry errors, which the fixed labels never trigger.
    pub fn new(num_tasks: u8, num_slots: u8) -> Result<Self> {
        let mut schedule = Self {
            encoding: Encoding::new(),
            num_tasks,
            num_slots,
        };
        schedule.add_dependency_axioms()?;
        schedule.add_slot_axioms()?;
        Ok(schedule)
    }

    #[must_use]
    pub const fn tasks(&self) -> RangeInclusive<Task> {
        1..=self.num_tasks
    }

    #[must_use]
    pub const fn slots(&self) -> RangeInclusive<Slot> {
        1..=self.num_slots
    }

    /// # Errors
    ///
    /// As for [`Encoding::var`].
    pub fn dep_on(&mut self, task: Task, on: Task) -> Result<Var> {
        self.encoding.var(TaskProp::DepOn(task, on))
    }

    /// # Errors
    ///
    /// As for [`Encoding::var`].
    pub fn at(&mut self, task: Task, slot: Slot) -> Result<Var> {
        self.encoding.var(TaskProp::At(task, slot))
    }

    fn add_dependency_axioms(&mut self) -> Result<()> {
        for t in self.tasks() {
            let dep = self.dep_on(t, t)?;
            self.encoding.add_constraint(!dep)?;
        }

        for (a, b, c) in iproduct!(self.tasks(), self.tasks(), self.tasks()) {
            let (ab, bc, ac) = (self.dep_on(a, b)?, self.dep_on(b, c)?, self.dep_on(a, c)?);
            self.encoding.add_constraint((ab & bc) >> ac)?;
        }
        Ok(())
    }

    fn add_slot_axioms(&mut self) -> Result<()> {
        let slot_pairs = iproduct!(self.slots(), self.slots()).filter(|(p, q)| p < q);
        for ((p, q), a, b) in iproduct!(slot_pairs, self.tasks(), self.tasks()) {
            let (early, late) = (self.at(a, p)?, self.at(b, q)?);
            let dep = self.dep_on(a, b)?;
            self.encoding.add_constraint((early & late) >> !dep)?;
        }

        for t in self.tasks() {
            let slots = self
                .slots()
                .map(|p| self.at(t, p))
                .collect::<Result<Vec<_>>>()?;
            self.encoding.add_exactly_one(slots)?;
        }

        for p in self.slots() {
            let occupants = self
                .tasks()
                .map(|t| self.at(t, p))
                .collect::<Result<Vec<_>>>()?;
            self.encoding.add_at_most_one(occupants)?;
        }
        Ok(())
    }

    /// Records that `task` depends on `on`.
    ///
    /// # Errors
    ///
    /// [`crate::Error::AlreadyCompiled`] after [`TaskSchedule::compile`].
    pub fn add_dependency(&mut self, task: Task, on: Task) -> Result<()> {
        let dep = self.dep_on(task, on)?;
        self.encoding.add_constraint(dep)
    }

    #[must_use]
    pub const fn encoding(&self) -> &Encoding<TaskProp> {
        &self.encoding
    }

    pub const fn encoding_mut(&mut self) -> &mut Encoding<TaskProp> {
        &mut self.encoding
    }

    /// # Errors
    ///
    /// [`crate::Error::AlreadyCompiled`] on a second call.
    pub fn compile(&mut self) -> Result<Theory> {
        self.encoding.compile()
    }

    #[must_use]
    pub fn placements(&self) -> Vec<Var> {
        self.encoding
            .variables_matching(|k| matches!(k, TaskProp::At(..)))
    }

    /// The task in each slot, `None` for an empty slot.
    #[must_use]
    pub fn decode(&self, solution: &Assignment) -> Vec<Option<Task>> {
        self.slots()
            .map(|p| {
                self.tasks().find(|&t| {
                    self.encoding
                        .get(&TaskProp::At(t, p))
                        .is_some_and(|v| solution.is_true(v))
                })
            })
            .collect()
    }

    /// The dependency pairs `(task, on)` that hold in `solution`.
    #[must_use]
    pub fn dependencies(&self, solution: &Assignment) -> Vec<(Task, Task)> {
        solution
            .true_vars()
            .filter_map(|v| match self.encoding.key(v) {
                Some(&TaskProp::DepOn(a, b)) => Some((a, b)),
                _ => None,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels() {
        assert_eq!(TaskProp::DepOn(3, 2).to_string(), "t3>t2");
        assert_eq!(TaskProp::At(1, 2).to_string(), "t1@p2");
    }

    #[test]
    fn test_dependency_runs_first() {
        let mut schedule = TaskSchedule::new(3, 4).unwrap();
        schedule.add_dependency(3, 2).unwrap();
        let theory = schedule.compile().unwrap();

        let solution = theory.solve().unwrap();
        let slots = schedule.decode(&solution);
        assert_eq!(slots.len(), 4);
        assert_eq!(slots.iter().flatten().count(), 3);

        let slot_of = |t: Task| slots.iter().position(|&x| x == Some(t));
        for (task, on) in schedule.dependencies(&solution) {
            assert!(slot_of(on) < slot_of(task), "t{task} runs before t{on}");
        }
        assert!(schedule.dependencies(&solution).contains(&(3, 2)));
    }

    #[test]
    fn test_cyclic_dependencies_are_unsatisfiable() {
        let mut schedule = TaskSchedule::new(3, 3).unwrap();
        schedule.add_dependency(1, 2).unwrap();
        schedule.add_dependency(2, 3).unwrap();
        schedule.add_dependency(3, 1).unwrap();
        assert!(!schedule.compile().unwrap().satisfiable());
    }

    #[test]
    fn test_chain_fixes_the_order() {
        let mut schedule = TaskSchedule::new(3, 3).unwrap();
        schedule.add_dependency(2, 1).unwrap();
        schedule.add_dependency(3, 2).unwrap();
        let theory = schedule.compile().unwrap();
        // dependencies are forced to the full chain, slots to 1, 2, 3
        assert_eq!(theory.count_solutions(), 1);
        let solution = theory.solve().unwrap();
        assert_eq!(schedule.decode(&solution), vec![Some(1), Some(2), Some(3)]);
    }
}

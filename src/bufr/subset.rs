// Subsets and bulletins.

use std::ops::{Deref, DerefMut};

use super::varcode::Varcode;
use super::var::Var;

/// One repetition unit of a bulletin: an ordered run of variables.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Subset {
    vars: Vec<Var>,
}

impl Subset {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn store_variable(&mut self, var: Var) {
        self.vars.push(var);
    }
}

impl From<Vec<Var>> for Subset {
    fn from(vars: Vec<Var>) -> Self {
        Self { vars }
    }
}

impl FromIterator<Var> for Subset {
    fn from_iter<I: IntoIterator<Item = Var>>(iter: I) -> Self {
        Self {
            vars: iter.into_iter().collect(),
        }
    }
}

impl Deref for Subset {
    type Target = Vec<Var>;

    fn deref(&self) -> &Self::Target {
        &self.vars
    }
}

impl DerefMut for Subset {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.vars
    }
}

/// A bulletin: its (expanded) data descriptor section and its subsets.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Bulletin {
    pub datadesc: Vec<Varcode>,
    pub subsets: Vec<Subset>,
}

impl Bulletin {
    pub fn new(datadesc: Vec<Varcode>) -> Self {
        Self {
            datadesc,
            subsets: Vec::new(),
        }
    }

    /// Append an empty subset and return it.
    pub fn obtain_subset(&mut self) -> &mut Subset {
        self.subsets.push(Subset::new());
        let last = self.subsets.len() - 1;
        &mut self.subsets[last]
    }
}

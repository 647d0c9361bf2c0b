/// Which situation a dialogue group is spoken in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DialogKind {
    /// Unprompted idle chatter.
    Chatter,
    /// After being dragged somewhere new.
    Moved,
    /// After being clicked without really moving.
    Touched,
}

/// Dialogue table of one skin: per kind, a set of line groups.
#[derive(Debug, Clone, Default)]
pub struct Dialogue {
    chatter: Vec<Vec<String>>,
    moved: Vec<Vec<String>>,
    touched: Vec<Vec<String>>,
}

fn owned(groups: &[&[&str]]) -> Vec<Vec<String>> {
    groups
        .iter()
        .map(|lines| lines.iter().map(|l| l.to_string()).collect())
        .collect()
}

impl Dialogue {
    pub fn new(chatter: &[&[&str]], moved: &[&[&str]], touched: &[&[&str]]) -> Self {
        Self {
            chatter: owned(chatter),
            moved: owned(moved),
            touched: owned(touched),
        }
    }

    pub fn groups(&self, kind: DialogKind) -> &[Vec<String>] {
        match kind {
            DialogKind::Chatter => &self.chatter,
            DialogKind::Moved => &self.moved,
            DialogKind::Touched => &self.touched,
        }
    }

    /// Uniformly pick one group of `kind`. `None` if the skin has none.
    pub fn pick(&self, kind: DialogKind, rng: &mut fastrand::Rng) -> Option<&[String]> {
        let groups = self.groups(kind);
        if groups.is_empty() {
            return None;
        }
        Some(&groups[rng.usize(0..groups.len())])
    }
}

/// Seconds between two lines of the same group.
pub const LINE_INTERVAL: f32 = 3.0;

/// The line group currently being spoken and a cursor into it.
#[derive(Debug, Clone)]
pub struct Speech {
    lines: Vec<String>,
    index: usize,
    timer: f32,
}

impl Speech {
    /// A group that counts as already spoken: nothing fires until a new
    /// group is started.
    pub fn finished(lines: Vec<String>) -> Self {
        let index = lines.len();
        Self {
            lines,
            index,
            timer: LINE_INTERVAL,
        }
    }

    /// Replace the active group; its first line fires on the next tick.
    pub fn start(&mut self, lines: Vec<String>) {
        self.lines = lines;
        self.index = 0;
        self.timer = 0.0;
    }

    pub fn speaking(&self) -> bool {
        self.index < self.lines.len()
    }

    #[cfg(test)]
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Count down; returns the next line when the interval lapses.
    pub fn tick(&mut self, dt: f32) -> Option<String> {
        self.timer -= dt;
        if self.timer > 0.0 {
            return None;
        }
        self.timer = LINE_INTERVAL;
        let line = self.lines.get(self.index).cloned();
        if line.is_some() {
            self.index += 1;
        }
        line
    }
}

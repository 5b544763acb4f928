//! Structured control tracking for function bodies.
//!
//! Branch targets in the binary format are relative label depths, so the
//! encoder keeps a stack of the open `if` and loop constructs and computes
//! depths from it.
//!
//! A loop is encoded as `block (loop ...)`: the outer block is the break
//! target and the inner loop the continue target. Each loop frame therefore
//! opens two labels.

/// An open structured construct.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Frame {
    If { has_else: bool },
    Loop,
}

/// Stack of open constructs, innermost last.
#[derive(Debug, Default)]
pub struct ControlStack {
    frames: Vec<Frame>,
}

impl ControlStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enter_if(&mut self) {
        self.frames.push(Frame::If { has_else: false });
    }

    /// Switch the innermost `if` to its alternative.
    pub fn enter_else(&mut self) -> Result<(), &'static str> {
        match self.frames.last_mut() {
            Some(Frame::If { has_else }) if !*has_else => {
                *has_else = true;
                Ok(())
            }
            Some(Frame::If { .. }) => Err("second else for one if"),
            _ => Err("else outside if"),
        }
    }

    pub fn exit_if(&mut self) -> Result<(), &'static str> {
        match self.frames.last() {
            Some(Frame::If { .. }) => {
                self.frames.pop();
                Ok(())
            }
            _ => Err("endif without matching if"),
        }
    }

    pub fn enter_loop(&mut self) {
        self.frames.push(Frame::Loop);
    }

    pub fn exit_loop(&mut self) -> Result<(), &'static str> {
        match self.frames.last() {
            Some(Frame::Loop) => {
                self.frames.pop();
                Ok(())
            }
            _ => Err("endloop without matching loop"),
        }
    }

    /// Label depth of the innermost loop's continue target: one label per
    /// `if` opened inside the loop.
    pub fn continue_depth(&self) -> Result<u32, &'static str> {
        let mut depth = 0;
        for frame in self.frames.iter().rev() {
            match frame {
                Frame::If { .. } => depth += 1,
                Frame::Loop => return Ok(depth),
            }
        }
        Err("branch outside loop")
    }

    /// Label depth of the innermost loop's break target.
    pub fn break_depth(&self) -> Result<u32, &'static str> {
        self.continue_depth().map(|depth| depth + 1)
    }

    pub fn in_loop(&self) -> bool {
        self.frames.contains(&Frame::Loop)
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

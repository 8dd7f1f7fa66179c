use super::types::{LineId, StackFrame};

/// Step modes for the debugger
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepMode {
    Into,
    Over,
    Out,
}

impl StepMode {
    /// Whether a step issued at `reference` depth is complete at `depth`.
    pub fn should_pause(self, depth: usize, reference: usize) -> bool {
        match self {
            StepMode::Into => true,
            StepMode::Over => depth <= reference,
            StepMode::Out => depth < reference,
        }
    }
}

/// Projects the runtime's GOSUB stack (innermost first) into frames, the
/// current line first. Frame `k` returns to `stack[k - 1]` at depth
/// `len - k`.
pub fn call_stack(current: &LineId, stack: &[LineId]) -> Vec<StackFrame> {
    let len = stack.len();
    std::iter::once(StackFrame {
        return_label: current.clone(),
        depth: len,
    })
    .chain(stack.iter().enumerate().map(|(i, label)| StackFrame {
        return_label: label.clone(),
        depth: len - (i + 1),
    }))
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_over_pauses_at_same_or_shallower_depth() {
        assert!(StepMode::Over.should_pause(1, 1));
        assert!(StepMode::Over.should_pause(0, 1));
        assert!(!StepMode::Over.should_pause(2, 1));
    }

    #[test]
    fn step_out_needs_a_return() {
        assert!(!StepMode::Out.should_pause(1, 1));
        assert!(StepMode::Out.should_pause(0, 1));
    }

    #[test]
    fn frames_from_innermost_stack() {
        let frames = call_stack(&LineId::from(100), &[LineId::from(20), LineId::from(10)]);
        let pairs: Vec<(LineId, usize)> = frames
            .into_iter()
            .map(|f| (f.return_label, f.depth))
            .collect();
        assert_eq!(
            pairs,
            vec![
                (LineId::from(100), 2),
                (LineId::from(20), 1),
                (LineId::from(10), 0),
            ]
        );
    }
}

//! Pipeline state
use std::fmt;

/// Number of pipeline stages
pub const STAGE_COUNT: usize = 5;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    Fetch,
    Decode,
    Execute,
    Memory,
    WriteBack,
}

impl Stage {
    pub const ALL: [Stage; STAGE_COUNT] = [
        Stage::Fetch,
        Stage::Decode,
        Stage::Execute,
        Stage::Memory,
        Stage::WriteBack,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Stage::Fetch => "IF",
            Stage::Decode => "ID",
            Stage::Execute => "EX",
            Stage::Memory => "MEM",
            Stage::WriteBack => "WB",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Pipeline state = which trace entry sits in each stage this cycle.
/// One slot per stage, so two instructions can never share a stage.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PipelineState {
    pub if_slot: Option<usize>,
    pub id_slot: Option<usize>,
    pub ex_slot: Option<usize>,
    pub mem_slot: Option<usize>,
    pub wb_slot: Option<usize>,
}

impl PipelineState {
    /// Everything moves one stage ahead; IF is left empty for fetch
    pub fn advance(&self) -> Self {
        Self {
            if_slot: None,
            id_slot: self.if_slot,
            ex_slot: self.id_slot,
            mem_slot: self.ex_slot,
            wb_slot: self.mem_slot,
        }
    }

    /// IF and ID hold their instructions and a bubble enters EX
    pub fn advance_stalled(&self) -> Self {
        Self {
            if_slot: self.if_slot,
            id_slot: self.id_slot,
            ex_slot: None,
            mem_slot: self.ex_slot,
            wb_slot: self.mem_slot,
        }
    }

    pub fn slot(&self, stage: Stage) -> Option<usize> {
        match stage {
            Stage::Fetch => self.if_slot,
            Stage::Decode => self.id_slot,
            Stage::Execute => self.ex_slot,
            Stage::Memory => self.mem_slot,
            Stage::WriteBack => self.wb_slot,
        }
    }
}

//! Static tool lookup keyed by stage / tool name.

use super::base::ReconTool;
use super::{Amass, Ffuf, Httpx, Nikto, Nuclei};
use crate::domain::StageName;

static AMASS: Amass = Amass;
static FFUF: Ffuf = Ffuf;
static HTTPX: Httpx = Httpx;
static NUCLEI: Nuclei = Nuclei;
static NIKTO: Nikto = Nikto;

/// The tool backing a pipeline stage; `None` for internal stages.
pub fn for_stage(stage: StageName) -> Option<&'static dyn ReconTool> {
    match stage {
        StageName::Amass => Some(&AMASS),
        StageName::Ffuf => Some(&FFUF),
        StageName::Aggregate => None,
        StageName::Httpx => Some(&HTTPX),
        StageName::Nuclei => Some(&NUCLEI),
        StageName::Nikto => Some(&NIKTO),
    }
}

/// Look a tool up by name.
pub fn by_name(name: &str) -> Option<&'static dyn ReconTool> {
    StageName::parse(name).and_then(for_stage)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_external_stage_has_a_tool() {
        for stage in StageName::ORDER {
            match stage.tool() {
                Some(tool_name) => {
                    let tool = for_stage(stage).expect("tool registered");
                    assert_eq!(tool.name(), tool_name);
                }
                None => assert!(for_stage(stage).is_none()),
            }
        }
    }

    #[test]
    fn by_name_rejects_unknown_tools() {
        assert!(by_name("httpx").is_some());
        assert!(by_name("aggregate").is_none());
        assert!(by_name("sqlmap").is_none());
    }
}

use crate::config::toml_config::AnchorToml;
use crate::core::program::{to_snake_case, Program, ProgramErrorDef};
use crate::domain::model::Pubkey;
use crate::programs::{hello_anchor, tic_tac_toe};
use crate::utils::error::{HarnessError, Result};
use std::collections::BTreeMap;

fn known_errors(name: &str) -> &'static [ProgramErrorDef] {
    match name {
        hello_anchor::PROGRAM_NAME => hello_anchor::ERRORS,
        tic_tac_toe::PROGRAM_NAME => tic_tac_toe::ERRORS,
        _ => &[],
    }
}

/// Programs declared for one cluster, looked up by name in any casing.
#[derive(Debug, Clone, Default)]
pub struct Workspace {
    programs: BTreeMap<String, Pubkey>,
}

impl Workspace {
    pub fn from_anchor_toml(manifest: &AnchorToml, cluster: &str) -> Result<Self> {
        let mut workspace = Self::default();
        for (name, id) in manifest.programs_for(cluster) {
            workspace.insert(&name, id.parse()?);
        }
        Ok(workspace)
    }

    /// Both example programs at their declared id.
    pub fn with_defaults() -> Result<Self> {
        let mut workspace = Self::default();
        workspace.insert(hello_anchor::PROGRAM_NAME, hello_anchor::PROGRAM_ID.parse()?);
        workspace.insert(tic_tac_toe::PROGRAM_NAME, tic_tac_toe::PROGRAM_ID.parse()?);
        Ok(workspace)
    }

    pub fn insert(&mut self, name: &str, id: Pubkey) {
        self.programs.insert(to_snake_case(name), id);
    }

    /// Fills in defaults for programs the manifest does not declare.
    pub fn merge_defaults(mut self) -> Result<Self> {
        for (name, id) in Self::with_defaults()?.programs {
            self.programs.entry(name).or_insert(id);
        }
        Ok(self)
    }

    pub fn names(&self) -> Vec<&str> {
        self.programs.keys().map(String::as_str).collect()
    }

    /// `HelloAnchor`, `hello_anchor` and `hello-anchor` all resolve the same program.
    pub fn program(&self, name: &str) -> Result<Program> {
        let key = to_snake_case(name);
        let id = self.programs.get(&key).ok_or_else(|| HarnessError::ConfigError {
            message: format!(
                "program '{}' is not in the workspace (known: {})",
                name,
                self.names().join(", ")
            ),
        })?;
        Ok(Program::new(*id, key.clone(), known_errors(&key)))
    }

    pub fn hello_anchor(&self) -> Result<hello_anchor::HelloAnchor> {
        Ok(hello_anchor::HelloAnchor::new(self.program(hello_anchor::PROGRAM_NAME)?))
    }

    pub fn tic_tac_toe(&self) -> Result<tic_tac_toe::TicTacToe> {
        Ok(tic_tac_toe::TicTacToe::new(self.program(tic_tac_toe::PROGRAM_NAME)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_accepts_any_casing() {
        let manifest = AnchorToml::from_toml_str(
            "[programs.localnet]\nhello_anchor = \"Fg6PaFpoGXkYsidMpWTK6W2BeZ7FEfcYkg476zPFsLnS\"\n",
        )
        .unwrap();
        let workspace = Workspace::from_anchor_toml(&manifest, "localnet").unwrap();

        for name in ["HelloAnchor", "hello_anchor", "hello-anchor"] {
            let program = workspace.program(name).unwrap();
            assert_eq!(program.name(), "hello_anchor");
            assert_eq!(program.id().to_string(), hello_anchor::PROGRAM_ID);
            assert!(program.lookup_error(300).is_some());
        }
    }

    #[test]
    fn test_unknown_program_lists_known_names() {
        let workspace = Workspace::with_defaults().unwrap();
        let err = workspace.program("Escrow").unwrap_err();
        let message = err.to_string();
        assert!(message.contains("Escrow"));
        assert!(message.contains("hello_anchor"));
        assert!(message.contains("tic_tac_toe"));
    }

    #[test]
    fn test_programs_outside_the_crate_have_no_error_table() {
        let mut workspace = Workspace::default();
        workspace.insert("Escrow", Pubkey([5u8; 32]));
        let program = workspace.program("escrow").unwrap();
        assert!(program.lookup_error(300).is_none());
        // framework errors still resolve
        assert!(program.lookup_error(101).is_some());
    }

    #[test]
    fn test_manifest_entries_override_defaults() {
        let mut workspace = Workspace::default();
        workspace.insert("hello_anchor", Pubkey([6u8; 32]));
        let merged = workspace.merge_defaults().unwrap();
        assert_eq!(merged.program("hello_anchor").unwrap().id(), Pubkey([6u8; 32]));
        assert!(merged.program("TicTacToe").is_ok());
    }
}

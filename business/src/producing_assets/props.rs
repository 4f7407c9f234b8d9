use std::any::Any;
use std::sync::Arc;

use origin_states::{State, state_assign_impl};

use crate::model::{AssetId, Certificate, ProducingAsset, User};

/// Inputs of the producing asset table, as handed in by the embedding view.
#[derive(Debug, Clone)]
pub struct AssetTableProps {
    pub producing_assets: Arc<Vec<ProducingAsset>>,
    pub certificates: Arc<Vec<Certificate>>,
    pub current_user: User,
    pub base_url: String,
    /// Show only assets owned by `current_user`.
    pub switched_to_organization: bool,
}

impl AssetTableProps {
    pub fn new(
        producing_assets: Arc<Vec<ProducingAsset>>,
        certificates: Arc<Vec<Certificate>>,
        current_user: User,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            producing_assets,
            certificates,
            current_user,
            base_url: base_url.into(),
            switched_to_organization: false,
        }
    }

    pub fn asset(&self, id: AssetId) -> Option<&ProducingAsset> {
        self.producing_assets.iter().find(|asset| asset.id == id)
    }
}

impl State for AssetTableProps {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn snapshot(&self) -> Option<Box<dyn Any + Send>> {
        Some(Box::new(self.clone()))
    }

    fn assign_box(&mut self, new_self: Box<dyn Any + Send>) {
        state_assign_impl(self, new_self);
    }
}

use std::sync::Arc;

use crate::application::flags::FeatureFlagService;

#[derive(Clone)]
pub struct ApiState {
    pub flags: Arc<FeatureFlagService>,
}

impl ApiState {
    pub fn new(flags: FeatureFlagService) -> Self {
        Self {
            flags: Arc::new(flags),
        }
    }
}

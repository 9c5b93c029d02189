//! The deployment customization hook.
//!
//! After the fixed part of a grant is assembled, a [`GrantCustomizer`]
//! fills in whatever the deployment knows and the broker does not: mainly
//! where the client should connect ([`Destination`]), plus any extra
//! fields its viewers expect.
//!
//! A customizer may fail on its own, independently of authentication. The
//! identity stays online in that case and the client is told the
//! destination is unavailable.

use std::collections::HashMap;

use gridgate_protocol::{Destination, LoginGrant, StartLocation};
use gridgate_session::Identity;

/// Width of a region in meters. Grid coordinates are multiplied by this to
/// get the global position viewers expect in `region_x`/`region_y`.
pub const REGION_SIZE: u32 = 256;

/// Why a customizer could not finish the grant.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CustomizeError {
    /// The requested start region is not known to the deployment.
    #[error("unknown region {0:?}")]
    UnknownRegion(String),

    /// The request asked for the last or home location, and the deployment
    /// has no default region to send it to.
    #[error("no default region configured")]
    NoDefaultRegion,

    /// The region's grid position does not fit the global coordinate range.
    #[error("region {0:?} lies outside the addressable grid")]
    OutOfGrid(String),

    /// The destination exists but cannot take logins right now.
    #[error("destination unavailable: {0}")]
    Unavailable(String),

    /// The customizer panicked. The panic was contained.
    #[error("customizer panicked")]
    Panicked,
}

/// Fills in the deployment-specific part of a grant.
pub trait GrantCustomizer: Send + Sync + 'static {
    /// Completes `grant` for `identity`, which asked to start at `start`.
    fn customize(
        &self,
        grant: &mut LoginGrant,
        identity: &Identity,
        start: &StartLocation,
    ) -> Result<(), CustomizeError>;
}

/// Leaves the grant as assembled.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCustomization;

impl GrantCustomizer for NoCustomization {
    fn customize(
        &self,
        _grant: &mut LoginGrant,
        _identity: &Identity,
        _start: &StartLocation,
    ) -> Result<(), CustomizeError> {
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// RegionDirectory
// ---------------------------------------------------------------------------

/// A simulator hosting one region.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionInfo {
    pub name: String,
    /// Grid position in region units.
    pub grid_x: u32,
    pub grid_y: u32,
    pub sim_ip: String,
    pub sim_port: u16,
    /// Base URL the region serves capabilities under, without a trailing
    /// slash.
    pub caps_url: String,
}

/// Resolves start locations against a fixed table of regions.
///
/// `Last` and `Home` go to the default region (the first one added, unless
/// set otherwise). A named region is looked up case-insensitively; an
/// unknown name fails customization.
#[derive(Debug, Clone, Default)]
pub struct RegionDirectory {
    regions: HashMap<String, RegionInfo>,
    default_region: Option<String>,
}

impl RegionDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a region. The first region added becomes the default.
    pub fn with_region(mut self, region: RegionInfo) -> Self {
        let key = region.name.to_lowercase();
        self.default_region.get_or_insert_with(|| key.clone());
        self.regions.insert(key, region);
        self
    }

    /// Makes `name` the region for `last` and `home` logins.
    pub fn with_default_region(mut self, name: &str) -> Self {
        self.default_region = Some(name.to_lowercase());
        self
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    fn resolve(&self, start: &StartLocation) -> Result<(&RegionInfo, [f32; 3]), CustomizeError> {
        match start {
            StartLocation::Last | StartLocation::Home => {
                let region = self
                    .default_region
                    .as_ref()
                    .and_then(|key| self.regions.get(key))
                    .ok_or(CustomizeError::NoDefaultRegion)?;
                Ok((region, [128.0, 128.0, 0.0]))
            }
            StartLocation::Region { name, x, y, z } => {
                let region = self
                    .regions
                    .get(&name.to_lowercase())
                    .ok_or_else(|| CustomizeError::UnknownRegion(name.clone()))?;
                Ok((region, [*x, *y, *z]))
            }
        }
    }
}

impl GrantCustomizer for RegionDirectory {
    fn customize(
        &self,
        grant: &mut LoginGrant,
        identity: &Identity,
        start: &StartLocation,
    ) -> Result<(), CustomizeError> {
        let (region, [x, y, z]) = self.resolve(start)?;
        let (region_x, region_y) = region
            .grid_x
            .checked_mul(REGION_SIZE)
            .zip(region.grid_y.checked_mul(REGION_SIZE))
            .ok_or_else(|| CustomizeError::OutOfGrid(region.name.clone()))?;

        grant.destination = Destination {
            sim_ip: region.sim_ip.clone(),
            sim_port: region.sim_port,
            region_x,
            region_y,
            look_at: "[r1,r0,r0]".into(),
            home: format!(
                "{{'region_handle':[r{region_x},r{region_y}], \
                 'position':[r{x},r{y},r{z}], 'look_at':[r1,r0,r0]}}"
            ),
            seed_capability: format!("{}/CAPS/{}/", region.caps_url, grant.session_id),
        };

        let start_kind = match start {
            StartLocation::Last => "last",
            StartLocation::Home => "home",
            StartLocation::Region { .. } => "url",
        };
        grant.extra.insert("start_location".into(), start_kind.into());

        tracing::debug!(
            agent_id = %identity.id,
            region = %region.name,
            start = %start,
            "destination resolved"
        );
        Ok(())
    }
}

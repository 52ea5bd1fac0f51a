/// Clients for the two external systems: the PhenoCam site metadata API and
/// the Earth Engine subset extraction service.
///
/// Submodules:
/// - `phenocam`    — site lookup by name.
/// - `earthengine` — the `SubsetExtractor` seam and its REST implementation.

pub mod earthengine;
pub mod phenocam;

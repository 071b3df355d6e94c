// Smoke-carrying Navier-Stokes timestepping struct

use na::DMatrix;
use tracing::{debug, info};

use crate::{
    error::{ConfigError, SimulationError},
    preprocessing::DisplayField,
    sim::{
        advection::advect,
        diffusion::diffuse,
        field::{ScalarField, VectorField},
        numeric,
        obstacle::{ObstacleMask, ObstacleShape, ShapeParams},
        poisson,
        sources::{self, InletBand},
    },
};

/// Every grid the solver mutates. Owned by [`Navier`] and lent to each
/// kernel for the duration of one call.
#[derive(Clone, Debug)]
pub struct FluidState {
    /// The velocity field `[u, v]`
    pub u: VectorField,

    /// The pressure field, carried between steps as the solver's warm start
    pub p: ScalarField,

    /// Smoke concentration
    pub density: ScalarField,

    /// Smoke injection rate
    pub source: ScalarField,

    /// The external-force field
    pub f: VectorField,

    /// Velocity from before advection, refilled every step
    u0: VectorField,
}

impl FluidState {
    /// Quiescent fluid with `ambient_force` everywhere, overridden inside the
    /// inlet band by the inlet velocity, its source rate and zero force.
    pub fn new(rows: usize, cols: usize, inlet: &InletBand, ambient_force: (f32, f32)) -> Self {
        let band = |inside: f32, outside: f32| {
            ScalarField::from_fn(rows, cols, |r, c| {
                if inlet.contains(r, c) { inside } else { outside }
            })
        };

        FluidState {
            u: [band(inlet.velocity.0, 0.), band(inlet.velocity.1, 0.)],
            p: ScalarField::new(rows, cols),
            density: ScalarField::new(rows, cols),
            source: band(inlet.source, 0.),
            f: [band(0., ambient_force.0), band(0., ambient_force.1)],
            u0: [ScalarField::new(rows, cols), ScalarField::new(rows, cols)],
        }
    }
}

/// Summary numbers for logging and health monitoring.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FieldStats {
    pub max_velocity: f32,
    pub total_density: f32,
    pub mean_abs_divergence: f32,
}

/// High-level smoke simulation object. Holds the fluid state and the
/// obstacle mask and advances them one timestep at a time.
pub struct Navier {
    /// The fluid viscosity, shared by velocity and smoke diffusion
    pub viscosity: f32,

    /// The mask representing solid obstacles
    mask: ObstacleMask,

    /// The mutable fields
    state: FluidState,

    /// The current time instant of the simulation
    pub t: f32,

    /// Iteration-counter
    i: usize,
}

impl Navier {
    /// Create a new simulation with an empty obstacle mask.
    ///
    /// Parameters
    /// - `rows`, `cols` - Grid dimensions
    /// - `viscosity` - Diffusion viscosity
    /// - `inlet` - The band of cells with fixed inflow and smoke source
    /// - `ambient_force` - External force (per unit mass) outside the inlet
    pub fn new(
        rows: usize,
        cols: usize,
        viscosity: f32,
        inlet: &InletBand,
        ambient_force: (f32, f32),
    ) -> Result<Self, ConfigError> {
        if rows < 3 || cols < 3 {
            return Err(ConfigError::GridTooSmall { rows, cols });
        }
        inlet.validate(rows, cols)?;

        Ok(Navier {
            viscosity,
            mask: ObstacleMask::new(rows, cols),
            state: FluidState::new(rows, cols, inlet, ambient_force),
            t: 0.,
            i: 0,
        })
    }

    /// Stamp an obstacle shape into the mask. Meant to be called once before
    /// stepping; stamping again is harmless since stamping only adds solids.
    pub fn configure_obstacle(&mut self, shape: ObstacleShape, params: ShapeParams) {
        self.mask.stamp(shape, params);
        info!(
            "Stamped {} obstacle ({} solid cells)",
            shape,
            self.mask.solid_count()
        );
    }

    /// Merge an externally loaded mask into the obstacle mask.
    pub fn stamp_mask(&mut self, mask: &ObstacleMask) -> Result<(), ConfigError> {
        self.mask.union(mask)?;
        info!("Merged obstacle mask ({} solid cells)", self.mask.solid_count());
        Ok(())
    }

    pub fn mask(&self) -> &ObstacleMask {
        &self.mask
    }

    /// Number of completed steps
    pub fn iteration(&self) -> usize {
        self.i
    }

    /// Advance the simulation by `dt`.
    ///
    /// Runs forces, smoke sourcing, advection of u, v and density (all traced
    /// through the velocity from before advection), diffusion of the same
    /// three fields, and the pressure projection. Afterwards every field is
    /// checked for NaN or infinity.
    pub fn step(&mut self, dt: f32) -> Result<(), SimulationError> {
        if !(dt.is_finite() && dt > 0.) {
            return Err(SimulationError::InvalidTimestep(dt));
        }

        let mask = &self.mask;
        let state = &mut self.state;

        sources::apply_forces(&mut state.u, &state.f, mask, dt);
        sources::source_smoke(&mut state.density, &state.source, mask, dt);

        state.u0[0].copy_from(&state.u[0]);
        state.u0[1].copy_from(&state.u[1]);
        advect(&state.u0, &mut state.u[0], mask, dt);
        advect(&state.u0, &mut state.u[1], mask, dt);
        advect(&state.u0, &mut state.density, mask, dt);

        diffuse(&mut state.u[0], mask, self.viscosity, dt);
        diffuse(&mut state.u[1], mask, self.viscosity, dt);
        diffuse(&mut state.density, mask, self.viscosity, dt);

        poisson::project(&mut state.p, &mut state.u, mask);

        self.i += 1;
        self.t += dt;

        self.check_health()?;

        debug!(step = self.i, t = self.t, "completed step");
        Ok(())
    }

    /// Fail if any solver field holds a NaN or infinite value.
    pub fn check_health(&self) -> Result<(), SimulationError> {
        let fields = [
            ("velocity-u", &self.state.u[0]),
            ("velocity-v", &self.state.u[1]),
            ("pressure", &self.state.p),
            ("density", &self.state.density),
        ];

        for (name, field) in fields {
            if !field.is_finite() {
                return Err(SimulationError::NonFinite {
                    field: name,
                    step: self.i,
                });
            }
        }

        Ok(())
    }

    pub fn stats(&self) -> FieldStats {
        FieldStats {
            max_velocity: numeric::velocity_magnitude(&self.state.u).max(),
            total_density: self.state.density.sum(),
            mean_abs_divergence: numeric::mean_abs_divergence(&self.state.u, &self.mask),
        }
    }

    /// A read-only copy of the requested field for rendering.
    pub fn snapshot(&self, field: DisplayField) -> DMatrix<f32> {
        match field {
            DisplayField::Velocity => numeric::velocity_magnitude(&self.state.u).to_matrix(),
            DisplayField::Pressure => self.state.p.to_matrix(),
            DisplayField::Smoke => self.state.density.to_matrix(),
        }
    }
}

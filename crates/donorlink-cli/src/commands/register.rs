//! Register command implementation

use crate::cli::RegisterArgs;
use crate::commands::build_pipeline;
use crate::dry_run::{display_plan, PlannedChange};
use crate::interactive::interactive_registration;
use crate::output::OutputWriter;
use crate::output_types::RegisterOutput;
use crate::progress::with_spinner;
use anyhow::{Context, Result};
use donorlink_core::config::LayeredConfig;
use donorlink_core::models::{DonorActivity, DonorProfile};
use donorlink_match::Registration;
use donorlink_store::DonorStore;

pub fn execute(
    args: RegisterArgs,
    config: &LayeredConfig,
    output: &OutputWriter,
    dry_run: bool,
) -> Result<()> {
    let registration = if args.interactive {
        interactive_registration()?
    } else {
        registration_from_args(args)?
    };

    let dataset = config.dataset.value.clone();
    let mut pipeline = build_pipeline(config)?;

    if dry_run {
        let (record, geocoded) = resolve(registration, |r| pipeline.prepare_registration(r))?;
        let index = pipeline.store().donors()?.len();

        let path = dataset.display().to_string();
        let mut changes = Vec::new();
        if !dataset.exists() {
            changes.push(PlannedChange::CreateDataset { path: path.clone() });
        }
        changes.push(PlannedChange::AppendDonor { path, index, geocoded, donor: record });
        return display_plan(output, &changes);
    }

    let outcome = resolve(registration, |r| pipeline.register(r))?;
    pipeline
        .into_store()
        .close()
        .with_context(|| format!("Failed to write donor dataset {}", dataset.display()))?;

    if output.is_json() {
        return output.result(RegisterOutput {
            dataset: dataset.display().to_string(),
            index: outcome.index,
            geocoded: outcome.geocoded,
            donor: outcome.record,
        });
    }

    let donor = &outcome.record;
    output.success(format!("Registered {} as donor #{}", donor.name, outcome.index));
    output.kv("Blood Type", donor.blood_type);
    output.kv("Location", &donor.location_text);
    output.kv(
        "Coordinates",
        format!(
            "{:.5}, {:.5}{}",
            donor.coordinates.latitude,
            donor.coordinates.longitude,
            if outcome.geocoded { " (geocoded)" } else { "" }
        ),
    );
    output.kv("Dataset", dataset.display());
    Ok(())
}

/// Run a registration step, with a spinner while the location is geocoded
fn resolve<T>(
    registration: Registration,
    step: impl FnOnce(Registration) -> donorlink_core::Result<T>,
) -> Result<T> {
    if registration.coordinates.is_some() {
        return step(registration).context("Failed to register donor");
    }

    let message = format!("Geocoding '{}'...", registration.location_text);
    with_spinner(
        &message,
        || step(registration),
        |_| "Location resolved".to_string(),
        "Geocoding failed",
    )
    .context("Failed to register donor")
}

fn registration_from_args(args: RegisterArgs) -> Result<Registration> {
    let mut registration = Registration::new(
        args.name.context("--name is required")?,
        args.age.context("--age is required")?,
        args.gender.context("--gender is required")?,
        args.blood_type.context("--blood-type is required")?,
        args.location.context("--location is required")?,
    )
    .with_profile(DonorProfile {
        medical_conditions: args.medical_conditions,
        allergies: args.allergies,
        blood_pressure: args.blood_pressure,
        height_cm: args.height,
        weight_kg: args.weight,
        contact_number: args.contact,
        country: args.country,
        state: args.state,
        district: args.district,
        pincode: args.pincode,
    });

    if let Some(coordinates) = args.coordinates {
        registration = registration.with_coordinates(coordinates);
    }
    if let (Some(recency), Some(frequency), Some(monetary), Some(time)) =
        (args.recency, args.frequency, args.monetary, args.time)
    {
        registration =
            registration.with_activity(DonorActivity::new(recency, frequency, monetary, time));
    }
    Ok(registration)
}

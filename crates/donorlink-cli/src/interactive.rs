use anyhow::Result;
use dialoguer::{Confirm, Input, Select};
use donorlink_core::models::{BloodType, DonorActivity, DonorProfile};
use donorlink_match::Registration;

fn optional_text(prompt: &str) -> Result<Option<String>> {
    let value: String = Input::new()
        .with_prompt(format!("{} (optional, press Enter to skip)", prompt))
        .allow_empty(true)
        .interact_text()?;
    let value = value.trim().to_string();
    Ok((!value.is_empty()).then_some(value))
}

fn optional_number(prompt: &str) -> Result<Option<f64>> {
    let value: String = Input::new()
        .with_prompt(format!("{} (optional, press Enter to skip)", prompt))
        .allow_empty(true)
        .validate_with(|input: &String| -> std::result::Result<(), String> {
            let input = input.trim();
            if input.is_empty() {
                return Ok(());
            }
            match input.parse::<f64>() {
                Ok(v) if v.is_finite() && v >= 0.0 => Ok(()),
                _ => Err("Enter a non-negative number".to_string()),
            }
        })
        .interact_text()?;
    let value = value.trim();
    Ok(if value.is_empty() { None } else { value.parse().ok() })
}

fn non_negative(prompt: &str) -> Result<f64> {
    let value: f64 = Input::new()
        .with_prompt(prompt)
        .default(0.0)
        .validate_with(|v: &f64| -> std::result::Result<(), String> {
            if v.is_finite() && *v >= 0.0 {
                Ok(())
            } else {
                Err("Enter a non-negative number".to_string())
            }
        })
        .interact_text()?;
    Ok(value)
}

/// Interactive donor registration form
pub fn interactive_registration() -> Result<Registration> {
    println!("\n🩸 Donor Registration\n");

    let name: String = Input::new()
        .with_prompt("Full name")
        .validate_with(|input: &String| -> std::result::Result<(), &str> {
            if input.trim().is_empty() {
                Err("Name is required")
            } else {
                Ok(())
            }
        })
        .interact_text()?;

    let age: u32 = Input::new().with_prompt("Age").interact_text()?;

    let genders = ["Male", "Female", "Other"];
    let gender_idx = Select::new().with_prompt("Gender").items(&genders).default(0).interact()?;

    let blood_labels: Vec<&str> = BloodType::ALL.iter().map(|b| b.as_str()).collect();
    let blood_idx =
        Select::new().with_prompt("Blood type").items(&blood_labels).default(0).interact()?;

    let profile = DonorProfile {
        medical_conditions: optional_text("Medical conditions")?,
        allergies: optional_text("Allergies")?,
        blood_pressure: optional_text("Blood pressure (e.g. 120/80)")?,
        height_cm: optional_number("Height (cm)")?,
        weight_kg: optional_number("Weight (kg)")?,
        contact_number: optional_text("Contact number")?,
        country: optional_text("Country")?,
        state: optional_text("State")?,
        district: optional_text("District")?,
        pincode: optional_text("Pincode")?,
    };

    let location: String = Input::new()
        .with_prompt("Location (street, area, city)")
        .validate_with(|input: &String| -> std::result::Result<(), &str> {
            if input.trim().is_empty() {
                Err("Location is required")
            } else {
                Ok(())
            }
        })
        .interact_text()?;

    let donated_before = Confirm::new()
        .with_prompt("Have you donated blood before?")
        .default(false)
        .interact()?;

    let activity = if donated_before {
        Some(DonorActivity::new(
            non_negative("Months since your last donation")?,
            non_negative("Number of donations so far")?,
            non_negative("Total blood donated (c.c.)")?,
            non_negative("Months since your first donation")?,
        ))
    } else {
        None
    };

    println!("\n📋 Registration Summary\n");
    println!("  Name:        {}", name.trim());
    println!("  Age:         {}", age);
    println!("  Gender:      {}", genders[gender_idx]);
    println!("  Blood type:  {}", blood_labels[blood_idx]);
    println!("  Location:    {}", location.trim());
    println!("  Donated:     {}", if donated_before { "Yes" } else { "No (first-time donor)" });
    println!();

    let confirmed = Confirm::new().with_prompt("Register this donor?").default(true).interact()?;
    if !confirmed {
        anyhow::bail!("Registration cancelled");
    }

    let mut registration = Registration::new(
        name.trim(),
        age,
        genders[gender_idx],
        BloodType::ALL[blood_idx],
        location.trim(),
    )
    .with_profile(profile);
    if let Some(activity) = activity {
        registration = registration.with_activity(activity);
    }
    Ok(registration)
}

use climate::climate::{ClimateDataSet, HOURS_PER_YEAR};
use climate::{
    ClearSkyModel, ClimateComponent, ClimateDataLoader, ClimateError, ClimateHeader, ErrorKind,
    Float, SolarRadiationModel, SolarRadiationOptions, PI, SECONDS_PER_YEAR,
};
use validate::assert_close;

fn location(city: &str) -> ClimateHeader {
    let (lat, lon, tz) = match city.as_bytes() {
        b"wellington" => (-41.3, 174.78, 12),
        b"barcelona" => (41.28, 2.07, 1),
        _ => panic!("Unsupported city '{}'", city),
    };
    ClimateHeader {
        city: city.into(),
        latitude_deg: Some(lat),
        longitude_deg: Some(lon),
        time_zone: tz,
        ..ClimateHeader::default()
    }
}

/// Constant radiation all year round, day and night
fn get_model(city: &str, dni: Float, dhi: Float, perez: bool) -> SolarRadiationModel {
    let mut ds = ClimateDataSet::hourly(location(city));
    *ds.channel_mut(ClimateComponent::DirectRadiationNormal) = vec![Some(dni); HOURS_PER_YEAR];
    *ds.channel_mut(ClimateComponent::DiffuseRadiationHorizontal) =
        vec![Some(dhi); HOURS_PER_YEAR];
    *ds.channel_mut(ClimateComponent::AirPressure) = vec![Some(101325.); HOURS_PER_YEAR];

    let mut climate = ClimateDataLoader::new();
    climate.load(ds).unwrap();
    let options = SolarRadiationOptions {
        perez_enabled: perez,
        ..SolarRadiationOptions::default()
    };
    SolarRadiationModel::new(climate, options)
}

/// North, East, South and West walls, plus a roof
fn add_surfaces(model: &mut SolarRadiationModel) -> Vec<usize> {
    let mut ids: Vec<usize> = (0..4)
        .map(|i| model.add_surface(i as Float * PI / 2., PI / 2.))
        .collect();
    ids.push(model.add_surface(0., 0.));
    ids
}

#[test]
fn duplicated_surfaces() {
    let mut model = get_model("barcelona", 0., 0., false);
    let a = model.add_surface(PI, PI / 2.);
    let b = model.add_surface(PI + 5e-6, PI / 2. - 5e-6);
    let c = model.add_surface(PI + 1e-3, PI / 2.);
    assert_eq!(a, b);
    assert_ne!(a, c);
    assert_eq!(model.n_surfaces(), 2);

    let e = model.radiation_load(42).unwrap_err();
    assert_eq!(e.kind(), ErrorKind::InvalidSurfaceId);
}

#[test]
fn normal_horizontal_round_trip() {
    for city in ["barcelona", "wellington"] {
        let mut model = SolarRadiationModel::for_location(&location(city));
        model.options.clear_sky_model = ClearSkyModel::None;
        for hour in (0..HOURS_PER_YEAR).step_by(7) {
            let t = hour as Float * 3600. + 1800.;
            let horizontal = model.convert_normal_to_horizontal_radiation(t, 300.);
            let normal = model.convert_horizontal_to_normal_radiation(t, horizontal);
            if model.sun_position.elevation > 1e-3 {
                assert_close!(normal, 300., 1e-6);
            } else {
                assert!(normal <= 300. + 1e-6);
            }
        }
    }
}

#[test]
fn night_invariant() -> Result<(), ClimateError> {
    for perez in [false, true] {
        let mut model = get_model("wellington", 600., 120., perez);
        let ids = add_surfaces(&mut model);
        let mut nights = 0;
        for hour in 0..HOURS_PER_YEAR {
            model.set_time(2007, hour as Float * 3600. + 600.)?;
            if model.sun_position.elevation > 0. {
                continue;
            }
            nights += 1;
            for id in ids.iter() {
                let load = model.radiation_load(*id)?;
                assert_close!(load.direct, 0.);
                assert_close!(load.incidence_angle, PI / 2.);
                if perez {
                    assert_close!(load.diffuse, 0.);
                }
            }
        }
        assert!(nights > 3000 && nights < 5800, "nights = {}", nights);
    }
    Ok(())
}

#[test]
fn radiation_is_bounded() -> Result<(), ClimateError> {
    for city in ["barcelona", "wellington"] {
        for perez in [false, true] {
            let mut model = get_model(city, 750., 150., perez);
            let ids = add_surfaces(&mut model);
            for hour in (0..HOURS_PER_YEAR).step_by(5) {
                model.set_time(2007, hour as Float * 3600. + 1234.)?;
                for id in ids.iter() {
                    let load = model.radiation_load(*id)?;
                    assert!(load.direct >= 0., "direct = {}", load.direct);
                    // The Perez model may go slightly negative close to the horizon
                    if !perez {
                        assert!(load.diffuse >= 0., "diffuse = {}", load.diffuse);
                    }
                    assert!((0. ..=PI / 2. + 1e-9).contains(&load.incidence_angle));
                    assert!(load.direct <= 750. + 1e-6);
                }
            }
        }
    }
    Ok(())
}

#[test]
fn equator_facing_walls() -> Result<(), ClimateError> {
    // Midday in winter: the sun is on the side of the equator
    let mut barcelona = get_model("barcelona", 600., 100., false);
    let ids = add_surfaces(&mut barcelona);
    barcelona.set_time(2007, 15. * 86400. + 12.5 * 3600.)?;
    let north = barcelona.radiation_load(ids[0])?;
    let south = barcelona.radiation_load(ids[2])?;
    assert!(south.direct > 300.);
    assert_close!(north.direct, 0.);

    let mut wellington = get_model("wellington", 600., 100., false);
    let ids = add_surfaces(&mut wellington);
    wellington.set_time(2007, 180. * 86400. + 12.5 * 3600.)?;
    let north = wellington.radiation_load(ids[0])?;
    let south = wellington.radiation_load(ids[2])?;
    assert!(north.direct > 300.);
    assert_close!(south.direct, 0.);
    Ok(())
}

#[test]
fn sky_models_share_direct_radiation() -> Result<(), ClimateError> {
    let mut isotropic = get_model("barcelona", 650., 110., false);
    let mut perez = get_model("barcelona", 650., 110., true);
    let a_ids = add_surfaces(&mut isotropic);
    let b_ids = add_surfaces(&mut perez);
    for hour in (0..HOURS_PER_YEAR).step_by(11) {
        let t = hour as Float * 3600. + 1800.;
        isotropic.set_time(2007, t)?;
        perez.set_time(2007, t)?;
        for (a, b) in a_ids.iter().zip(b_ids.iter()) {
            let a = isotropic.radiation_load(*a)?;
            let b = perez.radiation_load(*b)?;
            assert_close!(a.direct, b.direct, 1e-9);
            assert_close!(a.incidence_angle, b.incidence_angle, 1e-9);
        }
    }
    Ok(())
}

#[test]
fn isotropic_sky_without_perez() -> Result<(), ClimateError> {
    for city in ["barcelona", "wellington"] {
        let mut model = get_model(city, 650., 110., false);
        let mut surfaces: Vec<(usize, Float)> = add_surfaces(&mut model)
            .into_iter()
            .zip([PI / 2., PI / 2., PI / 2., PI / 2., 0.])
            .collect();
        surfaces.push((model.add_surface(PI, PI / 6.), PI / 6.));
        let albedo = model.options.albedo;

        let mut days = 0;
        for hour in (0..HOURS_PER_YEAR).step_by(13) {
            model.set_time(2007, hour as Float * 3600. + 900.)?;
            let elevation = model.sun_position.elevation;
            if elevation > 0. && elevation < 1e-4 {
                // Direct radiation is being faded in
                continue;
            }
            let current = model.climate.current();
            let diffuse_horizontal = current[ClimateComponent::DiffuseRadiationHorizontal];
            let ground_reflected = if elevation > 0. {
                days += 1;
                let direct_normal = current[ClimateComponent::DirectRadiationNormal];
                let (sin_elevation, _) = elevation.sin_cos();
                diffuse_horizontal + sin_elevation * direct_normal
            } else {
                diffuse_horizontal
            };

            for (id, inclination) in surfaces.iter() {
                let load = model.radiation_load(*id)?;
                if *inclination == 0. {
                    assert_eq!(load.diffuse, diffuse_horizontal);
                    continue;
                }
                let cos_half = (0.5 * inclination).cos();
                let to_sky = cos_half * cos_half;
                let sky = to_sky * diffuse_horizontal;
                let ground = albedo * (1. - to_sky) * ground_reflected;
                assert_eq!(load.diffuse, sky + ground, "hour {}", hour);
            }
        }
        assert!(days > 200, "days = {}", days);
    }
    Ok(())
}

#[test]
fn yearly_periodicity() -> Result<(), ClimateError> {
    let mut model = get_model("barcelona", 500., 90., true);
    let ids = add_surfaces(&mut model);
    for t in [3600. * 10.5, 100. * 86400. + 9. * 3600., 300. * 86400. + 15. * 3600.] {
        model.set_time(2007, t)?;
        let first: Vec<_> = ids.iter().map(|id| model.radiation_load(*id)).collect();
        model.set_time(2008, t + SECONDS_PER_YEAR)?;
        for (id, expected) in ids.iter().zip(first) {
            let expected = expected?;
            let found = model.radiation_load(*id)?;
            assert_close!(found.direct, expected.direct, 1e-6);
            assert_close!(found.diffuse, expected.diffuse, 1e-6);
        }
    }
    Ok(())
}

#[test]
fn options_from_json() -> Result<(), ClimateError> {
    let options = SolarRadiationOptions::from_json(r#"{"albedo": 0.0}"#)?;
    let mut ds = ClimateDataSet::hourly(location("barcelona"));
    *ds.channel_mut(ClimateComponent::DiffuseRadiationHorizontal) =
        vec![Some(100.); HOURS_PER_YEAR];
    let mut climate = ClimateDataLoader::new();
    climate.load(ds)?;

    let mut model = SolarRadiationModel::new(climate, options);
    let wall = model.add_surface(PI, PI / 2.);
    // Night: half of the sky, and nothing from the ground
    model.set_time(2007, 2. * 3600.)?;
    assert_close!(model.radiation_load(wall)?.diffuse, 50., 1e-9);
    Ok(())
}

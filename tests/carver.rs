use liquidcarve::{
    find_vertical_seam, Carver, CarverError, ColorDepth, GradientFunction, PixelBuffer, Rigidity,
    Severity, TwoDimensionalMap,
};

// A grey image with some structure: a diagonal ridge over a gentle
// horizontal ramp.
fn ridge(width: usize, height: usize) -> Vec<u8> {
    (0..height)
        .flat_map(|y| {
            (0..width).map(move |x| {
                if (x + y) % width == width / 2 {
                    250
                } else {
                    (x * 100 / width) as u8
                }
            })
        })
        .collect()
}

fn carver(width: usize, height: usize) -> Carver {
    let buffer = PixelBuffer::from_samples(width, height, 1, ridge(width, height)).unwrap();
    let mut carver = Carver::new(buffer).unwrap();
    carver.init(1, 0.0).unwrap();
    carver
}

#[test]
fn shrink_then_enlarge_restores_the_width() {
    let mut c = carver(24, 10);
    c.resize_width(13).unwrap();
    assert_eq!((c.width(), c.height()), (13, 10));
    c.resize_width(24).unwrap();
    assert_eq!((c.width(), c.height()), (24, 10));

    let out = c.readout().unwrap();
    assert_eq!((out.width(), out.height()), (24, 10));
    for y in 0..10 {
        for x in 0..24 {
            assert!(c.pixel(x, y, 0).is_ok());
        }
    }
    assert!(c.pixel(24, 0, 0).is_err());
}

#[test]
fn seams_stay_in_bounds() {
    let data = ridge(16, 12)
        .into_iter()
        .map(f64::from)
        .collect::<Vec<_>>();
    let energy = TwoDimensionalMap::from_vec(16, 12, data);
    for delta_x in 1..4 {
        let seam = find_vertical_seam(&energy, &Rigidity::new(0.5, delta_x, 12));
        assert_eq!(seam.len(), 12);
        assert!(seam.iter().all(|x| *x < 16));
        for pair in seam.windows(2) {
            assert!((pair[0] as isize - pair[1] as isize).abs() as usize <= delta_x);
        }
    }
}

#[test]
fn a_full_pass_labels_each_removed_pixel_once() {
    let mut c = carver(9, 5);
    c.resize_width(1).unwrap();
    assert_eq!(c.width(), 1);

    let map = c.dump_vmap();
    assert_eq!(map.depth, 9);
    // Twins of the removed pixels take the lowest levels; leave them
    // out and what is left is the original row.
    let twins = map.depth - 1;
    for y in 0..5 {
        let row = map
            .levels
            .row(y)
            .iter()
            .cloned()
            .filter(|v| *v == 0 || *v > twins)
            .collect::<Vec<_>>();
        assert_eq!(row.len(), 9);
        assert_eq!(row.iter().filter(|v| **v == 0).count(), 1);
        let mut levels = row.into_iter().filter(|v| *v != 0).collect::<Vec<_>>();
        levels.sort();
        levels.dedup();
        assert_eq!(levels.len(), 8);
    }
}

#[test]
fn zero_bias_changes_nothing() {
    let mut plain = carver(12, 6);
    let mut biased = carver(12, 6);
    biased.add_bias(&[1.0; 72], 0.0).unwrap();
    biased.add_bias_rgb(&[255; 72], 0.0, 1).unwrap();
    plain.resize_width(7).unwrap();
    biased.resize_width(7).unwrap();
    assert_eq!(plain.dump_vmap(), biased.dump_vmap());
    assert_eq!(plain.readout().unwrap(), biased.readout().unwrap());
}

#[test]
fn bias_steers_the_seams() {
    let mut c = carver(10, 4);
    c.set_gradient_function(GradientFunction::Null);
    // Offer column 7 for removal.
    let mut discard = vec![0.0; 40];
    for y in 0..4 {
        discard[y * 10 + 7] = 1.0;
    }
    c.add_bias(&discard, -100.0).unwrap();
    c.resize_width(9).unwrap();
    let map = c.dump_vmap();
    for y in 0..4 {
        // The twin sits at 7 and the removed pixel right after it.
        assert_eq!(map.levels[(8, y)], 2);
    }
}

#[test]
fn attached_carvers_follow_the_root() {
    let mut root = carver(14, 8);
    let aux = PixelBuffer::filled(ColorDepth::F32, 14, 8, 2, 0.5).unwrap();
    root.attach(Carver::new(aux).unwrap()).unwrap();

    root.resize_width(9).unwrap();
    let layer = &root.attached()[0];
    assert_eq!(layer.width(), root.width());
    assert_eq!(layer.dump_vmap(), root.dump_vmap());

    root.resize_width(17).unwrap();
    let layer = &root.attached()[0];
    assert_eq!(layer.width(), 17);
    assert_eq!(layer.dump_vmap(), root.dump_vmap());
    let out = layer.readout().unwrap();
    assert_eq!((out.depth(), out.channels()), (ColorDepth::F32, 2));
    assert_eq!(out.read(3, 3, 1), 0.5);
}

#[test]
fn aux_layers_can_stay_behind() {
    let mut root = carver(10, 5);
    root.attach(carver(10, 5)).unwrap();
    root.set_resize_aux_layers(false);
    root.resize_width(6).unwrap();
    assert_eq!(root.width(), 6);
    assert_eq!(root.attached()[0].width(), 10);
}

#[test]
fn height_round_trips_through_the_transpose() {
    let mut c = carver(6, 5);
    c.add_rigidity_mask(&[1.0; 30]).unwrap();
    let before = c.readout().unwrap();
    c.resize_height(5).unwrap();
    assert_eq!((c.width(), c.height()), (6, 5));
    c.resize_width(6).unwrap();
    assert_eq!((c.width(), c.height()), (6, 5));
    assert_eq!(c.readout().unwrap(), before);
}

#[test]
fn both_dimensions_at_once() {
    let mut c = carver(20, 16);
    c.set_side_switch_frequency(2);
    c.resize(12, 22).unwrap();
    assert_eq!((c.width(), c.height()), (12, 22));
    let out = c.readout().unwrap();
    assert_eq!((out.width(), out.height()), (12, 22));
}

#[test]
fn hot_pixel_is_avoided() {
    // Energy 1 everywhere except 100 at (2, 1), via the bias alone.
    let buffer = PixelBuffer::filled(ColorDepth::U8, 4, 3, 3, 0.5).unwrap();
    let mut c = Carver::new(buffer).unwrap();
    c.init(1, 0.0).unwrap();
    c.set_gradient_function(GradientFunction::Null);
    let mut bias = vec![1.0; 12];
    bias[4 + 2] = 100.0;
    c.add_bias(&bias, 8.0).unwrap();
    c.resize_width(3).unwrap();

    let map = c.dump_vmap();
    let row = map
        .levels
        .row(1)
        .iter()
        .cloned()
        .filter(|v| *v != 1)
        .collect::<Vec<_>>();
    assert_eq!(row.len(), 4);
    assert_eq!(row[2], 0);
    assert_eq!(row.iter().filter(|v| **v == 2).count(), 1);
}

#[test]
fn errors_report_their_severity() {
    let buffer = PixelBuffer::filled(ColorDepth::U16, 3, 3, 1, 0.0).unwrap();
    let mut idle = Carver::new(buffer).unwrap();
    match idle.resize_width(2) {
        Err(e @ CarverError::InactiveCarver) => assert_eq!(e.severity(), Severity::Recoverable),
        other => panic!("unexpected {:?}", other),
    }

    let mut c = carver(3, 3);
    match c.resize_width(0) {
        Err(e @ CarverError::InvalidGeometry(_)) => assert_eq!(e.severity(), Severity::Recoverable),
        other => panic!("unexpected {:?}", other),
    }
    c.resize_width(2).unwrap();
    assert_eq!(c.width(), 2);
}

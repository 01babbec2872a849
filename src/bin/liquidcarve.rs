use liquidcarve::{
    carver_from_image, energy_to_image, Carver, GradientFunction, LogProgress, ResizeOrder,
};
use std::io;
use std::process;

extern crate clap;
extern crate image;

use clap::{value_t, App, Arg, ArgMatches};
use failure::{format_err, Error};
use image::pnm::{PNMEncoder, PNMSubtype};
use image::{ColorType, GenericImageView};

fn main() {
    let matches = App::new("liquidcarve")
        .version("0.1.0")
        .author("Elf M. Sternberg <elf.sternberg@gmail.com>")
        .about("Content-aware image resizing by seam carving")
        .arg(
            Arg::with_name("input")
                .help("The image to resize")
                .required(true)
                .index(1),
        )
        .arg(
            Arg::with_name("output")
                .help("Where to write the result; a PAM file on stdout if absent")
                .index(2),
        )
        .arg(
            Arg::with_name("width")
                .short("W")
                .long("width")
                .takes_value(true)
                .help("Target width in pixels"),
        )
        .arg(
            Arg::with_name("height")
                .short("H")
                .long("height")
                .takes_value(true)
                .help("Target height in pixels"),
        )
        .arg(
            Arg::with_name("delta-x")
                .long("delta-x")
                .takes_value(true)
                .default_value("1")
                .help("Largest sideways step of a seam between two rows"),
        )
        .arg(
            Arg::with_name("rigidity")
                .long("rigidity")
                .takes_value(true)
                .default_value("0")
                .help("Penalty on sideways seam steps"),
        )
        .arg(
            Arg::with_name("enl-step")
                .long("enl-step")
                .takes_value(true)
                .default_value("2")
                .help("Largest growth factor of one enlargement round, in (1, 2]"),
        )
        .arg(
            Arg::with_name("gradient")
                .long("gradient")
                .takes_value(true)
                .default_value("norm")
                .possible_values(&["norm", "norm-bias", "sumabs", "xabs", "yabs", "null"])
                .help("Gradient function for the energy"),
        )
        .arg(
            Arg::with_name("order")
                .long("order")
                .takes_value(true)
                .default_value("horizontal")
                .possible_values(&["horizontal", "vertical"])
                .help("Which dimension to resize first"),
        )
        .arg(
            Arg::with_name("side-switch")
                .long("side-switch")
                .takes_value(true)
                .default_value("0")
                .help("How many times seams switch their left/right preference per pass"),
        )
        .arg(
            Arg::with_name("preserve")
                .long("preserve")
                .takes_value(true)
                .help("Mask image of regions to keep"),
        )
        .arg(
            Arg::with_name("discard")
                .long("discard")
                .takes_value(true)
                .help("Mask image of regions to remove first"),
        )
        .arg(
            Arg::with_name("bias-factor")
                .long("bias-factor")
                .takes_value(true)
                .default_value("1000")
                .help("Strength of the preserve and discard masks"),
        )
        .arg(
            Arg::with_name("rigidity-mask")
                .long("rigidity-mask")
                .takes_value(true)
                .help("Greyscale image scaling the rigidity per pixel"),
        )
        .arg(
            Arg::with_name("layer")
                .long("layer")
                .takes_value(true)
                .requires("layer-output")
                .help("Auxiliary image resized along with the input"),
        )
        .arg(
            Arg::with_name("layer-output")
                .long("layer-output")
                .takes_value(true)
                .requires("layer")
                .help("Where to write the resized auxiliary image"),
        )
        .arg(
            Arg::with_name("energy")
                .long("energy")
                .takes_value(true)
                .help("Also write the energy map of the input as a greyscale image"),
        )
        .arg(
            Arg::with_name("verbose")
                .short("v")
                .multiple(true)
                .help("More logging; repeat for more"),
        )
        .get_matches();

    let level = match matches.occurrences_of("verbose") {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    if let Err(e) = run(&matches) {
        eprintln!("liquidcarve: {}", e);
        process::exit(1);
    }
}

fn run(matches: &ArgMatches) -> Result<(), Error> {
    let input = matches.value_of("input").unwrap_or_default();
    let image = image::open(input)?.to_rgba();
    let (width, height) = image.dimensions();
    log::info!("{}: {}x{}", input, width, height);

    let mut carver = carver_from_image(&image)?;
    if let Some(layer) = matches.value_of("layer") {
        let layer = image::open(layer)?.to_rgba();
        carver.attach(carver_from_image(&layer)?)?;
    }

    carver.init(
        value_t!(matches, "delta-x", usize)?,
        value_t!(matches, "rigidity", f64)?,
    )?;
    carver.set_enl_step(value_t!(matches, "enl-step", f64)?)?;
    carver.set_gradient_function(
        matches
            .value_of("gradient")
            .unwrap_or_default()
            .parse::<GradientFunction>()?,
    );
    carver.set_resize_order(match matches.value_of("order") {
        Some("vertical") => ResizeOrder::Vertical,
        _ => ResizeOrder::Horizontal,
    });
    carver.set_side_switch_frequency(value_t!(matches, "side-switch", usize)?);
    carver.set_progress(Box::new(LogProgress::default()));

    let factor = value_t!(matches, "bias-factor", f64)?;
    add_mask_bias(&mut carver, matches.value_of("preserve"), factor, (width, height))?;
    add_mask_bias(&mut carver, matches.value_of("discard"), -factor, (width, height))?;
    if let Some(path) = matches.value_of("rigidity-mask") {
        let mask = load_sized(path, (width, height))?.to_luma();
        let values = mask.pixels().map(|p| f64::from(p[0]) / 255.0).collect::<Vec<_>>();
        carver.add_rigidity_mask(&values)?;
    }

    if let Some(path) = matches.value_of("energy") {
        energy_to_image(&carver.energy_map()?).save(path)?;
    }

    let target_width = optional_size(matches, "width")?.unwrap_or(width as usize);
    let target_height = optional_size(matches, "height")?.unwrap_or(height as usize);
    carver.resize(target_width, target_height)?;

    let out: image::RgbaImage = carver.to_image()?;
    match matches.value_of("output") {
        Some(path) => out.save(path)?,
        None => {
            let (width, height) = out.dimensions();
            PNMEncoder::new(io::stdout())
                .with_subtype(PNMSubtype::ArbitraryMap)
                .encode(out.into_raw().as_slice(), width, height, ColorType::RGBA(8))?
        }
    }

    if let Some(path) = matches.value_of("layer-output") {
        let layer = carver
            .attached()
            .first()
            .ok_or_else(|| format_err!("the layer was not attached"))?;
        let layer: image::RgbaImage = layer.to_image()?;
        layer.save(path)?;
    }
    Ok(())
}

fn optional_size(matches: &ArgMatches, name: &str) -> Result<Option<usize>, Error> {
    if matches.is_present(name) {
        Ok(Some(value_t!(matches, name, usize)?))
    } else {
        Ok(None)
    }
}

fn load_sized(path: &str, size: (u32, u32)) -> Result<image::DynamicImage, Error> {
    let mask = image::open(path)?;
    if mask.dimensions() != size {
        return Err(format_err!(
            "{} is {}x{}, the input is {}x{}",
            path,
            mask.width(),
            mask.height(),
            size.0,
            size.1
        ));
    }
    Ok(mask)
}

fn add_mask_bias(
    carver: &mut Carver,
    path: Option<&str>,
    factor: f64,
    size: (u32, u32),
) -> Result<(), Error> {
    if let Some(path) = path {
        let mask = load_sized(path, size)?.to_rgba();
        carver.add_bias_rgb(&mask.into_raw(), factor, 4)?;
    }
    Ok(())
}

use clap::{value_parser, Arg, ArgMatches, Command};
use half::f16;
use stridewise::prelude::*;
use stridewise::{Align, Element};

pub fn start_logger(level: log::LevelFilter) {
    let logger = fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "{}[{}][{}] {}",
                chrono::Local::now().format("[%Y-%m-%d][%H:%M:%S]"),
                record.target(),
                record.level(),
                message
            ))
        })
        .level(level)
        .chain(std::io::stderr())
        .apply();
    match logger {
        Ok(_) => log::info!("Logging initialized."),
        Err(error) => eprintln!("Error initializing logging: {:?}", error),
    }
}

fn extent_from(matches: &ArgMatches) -> Dim2 {
    let x = *matches.get_one::<isize>("extent-x").unwrap();
    let y = *matches.get_one::<isize>("extent-y").unwrap();
    dim![x, y]
}

/// Row of a dense-X buffer is dense, the column is strided.
fn demo_dense_x(extent: Dim2) -> anyhow::Result<()> {
    let buffer = HostBackend::new().allocate_2d_dense_x::<i32>(extent)?;
    let root = buffer.root_view()?;
    let third_row: ArrayView1D<'_, i32, Dense1D> = root.slice_along_y(2)?;
    let third_col: ArrayView1D<'_, i32, General1D> = root.slice_along_x(2)?;
    third_row.set(dim![4], 7)?;
    println!(
        "dense X {:?}: row stride {:?}, column stride {:?}, [4, 2] = {}",
        extent,
        third_row.stride(),
        third_col.stride(),
        root.get(dim![4, 2])?
    );
    Ok(())
}

/// A view whose type forgets its layout can be re-tagged once the layout is checked.
fn demo_dense_y(extent: Dim2) -> anyhow::Result<()> {
    fn kernel<S: Stride2D>(arr: ArrayView2D<'_, i32, S>) -> anyhow::Result<i32> {
        let arr_y = arr.as_dense_y()?;
        let third_row: ArrayView1D<'_, i32, General1D> = arr_y.slice_along_y(2)?;
        let third_col: ArrayView1D<'_, i32, Dense1D> = arr_y.slice_along_x(2)?;
        Ok(third_row.get(dim![4])? + third_col.get(dim![2])?)
    }

    let buffer = HostBackend::new().allocate_2d_dense_y::<i32>(extent)?;
    let root = buffer.root_view()?;
    root.set(dim![4, 2], 40)?;
    root.set(dim![2, 2], 2)?;
    let result = kernel(root.as_general())?;
    println!("dense Y {:?}: row[4] + column[2] = {}", extent, result);

    let row_major = HostBackend::new().allocate_2d_dense_x::<i32>(extent)?;
    match kernel(row_major.root_view()?) {
        Err(e) => println!("dense X {:?} rejected as dense Y: {}", extent, e),
        Ok(_) => anyhow::bail!("dense X buffer coerced to dense Y"),
    }
    Ok(())
}

fn demo_tile() -> anyhow::Result<()> {
    let buffer = HostBackend::new().allocate_2d::<i32>(dim![100, 100])?;
    let tile: ArrayView2D<'_, i32, DenseX> =
        buffer.root_view()?.sub_view(dim![25, 25], dim![5, 5])?;
    println!(
        "tile {:?} of [100x100]: stride {:?}, tag {:?}",
        tile.extent(),
        tile.stride(),
        tile.tag()
    );
    Ok(())
}

fn report_pitch<T: Element>(name: &str, extent: Dim2) -> anyhow::Result<()> {
    let buffer = HostBackend::new().allocate_pitched_2d_x::<T>(extent)?;
    let root = buffer.root_view()?;
    println!(
        "pitched {} {:?}: pitch {} elements ({} bytes), {} bytes allocated",
        name,
        extent,
        root.stride().y,
        root.stride().y as usize * std::mem::size_of::<T>(),
        buffer.n_bytes()
    );
    Ok(())
}

fn handle_demo(matches: &ArgMatches) -> anyhow::Result<()> {
    let extent = extent_from(matches);
    demo_dense_x(extent)?;
    demo_dense_y(extent)?;
    demo_tile()
}

fn handle_pitch(matches: &ArgMatches) -> anyhow::Result<()> {
    let extent = extent_from(matches);
    let dtype = matches.get_one::<String>("dtype").unwrap();
    println!("pitch alignment: {} bytes", usize::PITCH_ALIGNMENT);
    match dtype.as_str() {
        "u8" => report_pitch::<u8>(dtype, extent),
        "f16" => report_pitch::<f16>(dtype, extent),
        "f32" => report_pitch::<f32>(dtype, extent),
        "f64" => report_pitch::<f64>(dtype, extent),
        "rgb8" => report_pitch::<[u8; 3]>(dtype, extent),
        _ => anyhow::bail!("unsupported dtype {}", dtype),
    }
}

fn extent_args(command: Command, x: &'static str, y: &'static str) -> Command {
    command
        .arg(
            Arg::new("extent-x")
                .short('x')
                .long("extent-x")
                .default_value(x)
                .value_parser(value_parser!(isize))
                .help("Extent along X"),
        )
        .arg(
            Arg::new("extent-y")
                .short('y')
                .long("extent-y")
                .default_value(y)
                .value_parser(value_parser!(isize))
                .help("Extent along Y"),
        )
}

fn main() -> anyhow::Result<()> {
    let matches = Command::new("stridewise")
        .about("Exercises statically tagged strided views")
        .version("0.1.0")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("log-level")
                .short('l')
                .long("log-level")
                .global(true)
                .default_value("warn")
                .value_parser(value_parser!(log::LevelFilter))
                .help("Log level"),
        )
        .subcommand(extent_args(
            Command::new("demo").long_about("Slices, coerces and tiles 2D views."),
            "10",
            "20",
        ))
        .subcommand(
            extent_args(
                Command::new("pitch").long_about("Reports the row pitch of a padded allocation."),
                "10",
                "4",
            )
            .arg(
                Arg::new("dtype")
                    .short('d')
                    .long("dtype")
                    .default_value("f32")
                    .value_parser(["u8", "f16", "f32", "f64", "rgb8"])
                    .help("Element type"),
            ),
        )
        .get_matches();

    start_logger(*matches.get_one::<log::LevelFilter>("log-level").unwrap());

    if let Some(matches) = matches.subcommand_matches("demo") {
        handle_demo(matches)?;
    } else if let Some(matches) = matches.subcommand_matches("pitch") {
        handle_pitch(matches)?;
    }
    Ok(())
}

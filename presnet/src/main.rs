use anyhow::{ensure, format_err, Context, Result};
use clap::Parser;
use presnet::{PResNet, PResNetInit};
use prettytable::{cell, row, Table};
use std::{path::PathBuf, str::FromStr};
use tch::{nn, Device, Kind, Tensor};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct InputSize {
    height: i64,
    width: i64,
}

impl FromStr for InputSize {
    type Err = anyhow::Error;

    fn from_str(text: &str) -> Result<Self> {
        let (height, width) = text
            .split_once('x')
            .ok_or_else(|| format_err!("expect input size in HxW format, but get '{}'", text))?;
        let height: i64 = height.trim().parse()?;
        let width: i64 = width.trim().parse()?;
        ensure!(height > 0 && width > 0, "input size must be positive");
        Ok(Self { height, width })
    }
}

#[derive(Debug, Clone, Parser)]
/// Show the stage layout of a PResNet backbone configuration.
struct Opts {
    /// configuration file
    config_file: PathBuf,
    /// run a forward pass on a zero image of size HxW
    #[clap(long)]
    forward: Option<InputSize>,
    /// batch size of the forward pass
    #[clap(long, default_value = "1")]
    batch_size: i64,
}

fn main() -> Result<()> {
    pretty_env_logger::init();

    let Opts {
        config_file,
        forward,
        batch_size,
    } = Opts::parse();

    let init = PResNetInit::load(&config_file)
        .with_context(|| format!("failed to load config file '{}'", config_file.display()))?;
    let in_channels = init.in_channels as i64;
    let depth = init.depth;
    let variant = init.variant;

    let mut vs = nn::VarStore::new(Device::Cpu);
    let model = PResNet::new(&mut vs, init)?;

    println!(
        "PResNet{}-{} with {} parameters",
        depth,
        variant.as_ref(),
        count_parameters(&vs)
    );

    // print stage information
    {
        let mut table = Table::new();
        table.add_row(row![
            "stage", "block", "blocks", "channels", "stride", "returned", "frozen"
        ]);

        model.stage_infos().iter().for_each(|info| {
            table.add_row(row![
                info.index,
                info.kind.as_ref(),
                info.num_blocks,
                info.out_c,
                info.stride,
                info.returned,
                info.frozen,
            ]);
        });

        table.printstd();
    }

    if let Some(InputSize { height, width }) = forward {
        let input = Tensor::zeros(
            &[batch_size, in_channels, height, width],
            (Kind::Float, Device::Cpu),
        );
        let outputs = tch::no_grad(|| model.forward_t(&input, false));

        let mut table = Table::new();
        table.add_row(row!["stage", "output shape"]);
        model
            .return_idx()
            .iter()
            .zip(outputs.iter())
            .for_each(|(index, output)| {
                table.add_row(row![index, format!("{:?}", output.size())]);
            });
        table.printstd();
    }

    Ok(())
}

fn count_parameters(vs: &nn::VarStore) -> i64 {
    vs.variables()
        .values()
        .map(|tensor| tensor.numel() as i64)
        .sum()
}

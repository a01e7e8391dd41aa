use anyhow::Result;
use presnet::{BlockKind, Depth, PResNetInit, Variant};
use std::path::{Path, PathBuf};
use tch::{nn, Device, Kind, Tensor};

const MODEL_FILE_NAMES: &[&str] = &[
    "presnet18-vd.json5",
    "presnet50-vd-frozen.json5",
    "presnet101-b.json5",
];

lazy_static::lazy_static! {
    static ref CONFIG_DIR: PathBuf = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests").join("cfg");
    static ref MODEL_FILES: Vec<PathBuf> = {
        MODEL_FILE_NAMES.iter().map(|file_name| CONFIG_DIR.join(file_name)).collect()
    };
}

#[test]
fn load_config_test() -> Result<()> {
    MODEL_FILES.iter().try_for_each(|path| -> Result<_> {
        let init = PResNetInit::load(path)?;
        init.validate()?;
        Ok(())
    })?;
    Ok(())
}

#[test]
fn presnet50_frozen_config_test() -> Result<()> {
    let init = PResNetInit::load(CONFIG_DIR.join("presnet50-vd-frozen.json5"))?;
    assert_eq!(init.depth, Depth::R50);
    assert_eq!(init.variant, Variant::D);
    assert_eq!(init.block_kind(), BlockKind::BottleNeck);
    assert_eq!(init.out_channels(), vec![512, 1024, 2048]);
    assert_eq!(init.out_strides(), vec![8, 16, 32]);
    assert_eq!(init.freeze_at, Some(0));

    let vs = nn::VarStore::new(Device::Cpu);
    let model = init.build(&vs.root())?;

    // freeze_at 0 freezes the stem only
    assert!(model.is_stem_frozen());
    assert_eq!(model.num_frozen_stages(), 0);
    let variables = vs.variables();
    assert!(!variables["conv1.conv1_1.conv.weight"].requires_grad());
    assert!(variables["res_layers.0.blocks.0.branch2a.conv.weight"].requires_grad());

    let input = Tensor::rand(&[1, 3, 64, 64], (Kind::Float, Device::Cpu));
    let outputs = tch::no_grad(|| model.forward_t(&input, false));
    assert_eq!(outputs.len(), 3);
    assert_eq!(outputs[2].size(), vec![1, 2048, 2, 2]);
    Ok(())
}

#[test]
fn presnet101_basic_stem_test() -> Result<()> {
    let init = PResNetInit::load(CONFIG_DIR.join("presnet101-b.json5"))?;
    assert!(!init.variant.has_deep_stem());
    assert_eq!(init.out_channels(), vec![2048]);

    let vs = nn::VarStore::new(Device::Cpu);
    let model = init.build(&vs.root())?;
    assert_eq!(model.stem().len(), 1);
    assert_eq!(model.stages()[2].blocks().len(), 23);

    let variables = vs.variables();
    assert_eq!(
        variables["conv1.conv1_1.conv.weight"].size(),
        vec![64, 3, 7, 7]
    );
    // variant b projects with a strided 1x1 convolution
    assert!(variables.contains_key("res_layers.1.blocks.0.short.conv.weight"));
    assert!(!variables.contains_key("res_layers.1.blocks.0.short.conv.conv.weight"));
    Ok(())
}

#[test]
fn pretrained_config_test() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let checkpoint = dir.path().join("presnet18.ot");

    let init = PResNetInit::load(CONFIG_DIR.join("presnet18-vd.json5"))?;
    let source_vs = nn::VarStore::new(Device::Cpu);
    let _source = init.clone().build(&source_vs.root())?;
    source_vs.save(&checkpoint)?;

    let mut target_vs = nn::VarStore::new(Device::Cpu);
    let _target = presnet::PResNet::new(
        &mut target_vs,
        PResNetInit {
            pretrained: Some(checkpoint),
            ..init
        },
    )?;

    let source = source_vs.variables();
    let target = target_vs.variables();
    let name = "res_layers.3.blocks.1.branch2b.conv.weight";
    let diff = f64::from((&source[name] - &target[name]).abs().max());
    assert!(diff < 1e-9);
    Ok(())
}
